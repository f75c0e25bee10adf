//! In-memory vector index.
//!
//! Immutable once built; shared between requests through [`super::IndexCache`].

use super::{rank_documents, Document, SearchResult, VectorIndex};
use crate::error::Result;
use async_trait::async_trait;

/// In-memory index over the chunks of a single transcript.
#[derive(Debug)]
pub struct MemoryIndex {
    video_id: String,
    documents: Vec<Document>,
}

impl MemoryIndex {
    /// Build an index from documents in transcript order.
    pub fn new(video_id: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            video_id: video_id.into(),
            documents,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        Ok(rank_documents(
            self.documents.iter().cloned(),
            query_embedding,
            limit,
        ))
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.documents.len())
    }
}
