//! Semantic segmentation of transcripts into retrievable chunks.

mod semantic;
pub mod sentences;
pub mod threshold;

pub use semantic::SemanticChunker;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A contiguous, semantically coherent span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the transcript.
    pub order: usize,
}

impl Chunk {
    pub fn new(content: impl Into<String>, order: usize) -> Self {
        Self {
            content: content.into(),
            order,
        }
    }
}

/// Trait for segmentation implementations.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks. Empty text yields no chunks.
    async fn chunk(&self, text: &str) -> Result<Vec<Chunk>>;
}
