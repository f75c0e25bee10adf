//! Vector indexes over transcript chunks.
//!
//! Two lifecycles are supported: a single SQLite index at a fixed path that is
//! destroyed and rebuilt for every request ([`SqliteIndex`]), and in-memory
//! indexes kept in a bounded LRU keyed by transcript fingerprint
//! ([`IndexCache`] of [`MemoryIndex`]).

mod cache;
mod memory;
mod sqlite;

pub use cache::{fingerprint, IndexCache};
pub use memory::MemoryIndex;
pub use sqlite::{IndexMeta, SqliteIndex};

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chunk stored in an index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Position of the chunk in the transcript; also the insertion order.
    pub chunk_order: usize,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            chunk_order: chunk.order,
            content: chunk.content,
            embedding,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// A queryable set of embedded chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The `limit` most similar documents, best first; ties keep insertion order.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Number of documents in the index.
    async fn document_count(&self) -> Result<usize>;
}

/// Score documents against a query and keep the top `limit`.
///
/// Documents must be given in insertion order; the sort is stable so equal
/// scores keep that order.
pub fn rank_documents(
    documents: impl IntoIterator<Item = Document>,
    query_embedding: &[f32],
    limit: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = documents
        .into_iter()
        .map(|document| {
            let score = cosine_similarity(query_embedding, &document.embedding);
            SearchResult { document, score }
        })
        .collect();

    // NaN scores rank last
    let key = |score: f32| if score.is_nan() { f32::NEG_INFINITY } else { score };
    results.sort_by(|a, b| key(b.score).total_cmp(&key(a.score)));
    results.truncate(limit);
    results
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
