//! Embedding generation for segmentation and retrieval.
//!
//! One embedder is shared by the segmenter, the index and the query side so
//! all vectors live in the same space.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Confirm the embedding model can be used.
    async fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Name of the embedding model.
    fn model(&self) -> &str;
}
