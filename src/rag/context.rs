//! Retrieval of the chunks most relevant to a question.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorIndex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds questions and searches an index for the closest chunks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    /// At most `top_k` chunks, best first. Fewer when the index is smaller.
    #[instrument(skip(self, index))]
    pub async fn search(&self, index: &dyn VectorIndex, question: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(question).await?;

        let chunks: Vec<ContextChunk> = index
            .search(&query_embedding, self.top_k)
            .await?
            .into_iter()
            .map(ContextChunk::from)
            .collect();

        debug!("Retrieved {} chunks", chunks.len());
        Ok(chunks)
    }
}

/// Join chunk texts with a blank line, in retrieval order.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[{}] chunk #{} (score: {:.2})\n{}",
                i + 1,
                chunk.chunk_order,
                chunk.score,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
