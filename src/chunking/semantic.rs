//! Embedding-based semantic chunking.
//!
//! Sentences are embedded together with their neighbors, the cosine distance
//! between consecutive sentences is measured, and a boundary is placed
//! wherever that distance exceeds a threshold taken from the document's own
//! distance distribution.

use super::sentences::{combine_with_neighbors, split_units};
use super::threshold::breakpoints;
use super::{Chunk, Chunker};
use crate::config::ChunkingSettings;
use crate::embedding::Embedder;
use crate::error::{Result, VidqaError};
use crate::vector_store::cosine_similarity;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Semantic chunker driven by an [`Embedder`].
pub struct SemanticChunker {
    embedder: Arc<dyn Embedder>,
    settings: ChunkingSettings,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn Embedder>, settings: ChunkingSettings) -> Self {
        Self { embedder, settings }
    }

    /// Cosine distance between each pair of consecutive embeddings.
    fn distances(embeddings: &[Vec<f32>]) -> Vec<f64> {
        embeddings
            .windows(2)
            .map(|pair| 1.0 - f64::from(cosine_similarity(&pair[0], &pair[1])))
            .collect()
    }
}

#[async_trait]
impl Chunker for SemanticChunker {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let spans = split_units(text, self.settings.max_sentence_words);

        match spans.len() {
            0 => return Ok(Vec::new()),
            1 => return Ok(vec![Chunk::new(spans[0].text(text), 0)]),
            _ => {}
        }

        let units: Vec<&str> = spans.iter().map(|s| s.text(text)).collect();
        let combined = combine_with_neighbors(&units, self.settings.buffer_size);

        let embeddings = self.embedder.embed_batch(&combined).await?;
        if embeddings.len() != combined.len() {
            return Err(VidqaError::Segmentation(format!(
                "Expected {} sentence embeddings, got {}",
                combined.len(),
                embeddings.len()
            )));
        }

        let distances = Self::distances(&embeddings);
        let boundaries = breakpoints(
            &distances,
            self.settings.threshold_type,
            self.settings.effective_amount(),
        );
        debug!(
            "{} sentences, {} boundaries ({} {})",
            units.len(),
            boundaries.len(),
            self.settings.threshold_type,
            self.settings.effective_amount()
        );

        let mut chunks = Vec::with_capacity(boundaries.len() + 1);
        let mut first = 0;
        for last in boundaries.into_iter().chain(std::iter::once(spans.len() - 1)) {
            if last < first {
                continue;
            }
            let content = &text[spans[first].start..spans[last].end];
            chunks.push(Chunk::new(content, chunks.len()));
            first = last + 1;
        }

        info!("Created {} semantic chunks", chunks.len());
        Ok(chunks)
    }
}
