//! Retrieval-augmented answering over a single transcript index.

pub mod context;
mod response;

pub use context::{format_context_for_display, Retriever};
pub use response::AnswerGenerator;

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved chunk as handed to the prompt and shown to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextChunk {
    /// Position of the chunk in the transcript.
    pub chunk_order: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            chunk_order: result.document.chunk_order,
            content: result.document.content,
            score: result.score,
        }
    }
}
