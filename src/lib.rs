//! vidqa - Question answering over YouTube transcripts
//!
//! Fetches the captions of a YouTube video, splits them into semantically
//! coherent chunks, indexes the chunks by embedding, and answers questions
//! with an LLM that is instructed to rely only on the retrieved context.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Caption track discovery and transcript fetching
//! - `chunking` - Embedding-driven semantic segmentation
//! - `embedding` - Embedding capability (OpenAI-compatible APIs, e.g. Ollama)
//! - `generation` - Text generation capability
//! - `vector_store` - Per-request SQLite slot or cached in-memory indexes
//! - `rag` - Retrieval and grounded answer generation
//! - `orchestrator` - The question-answering pipeline
//! - `cli` - Command line and HTTP adapters
//!
//! # Example
//!
//! ```rust,no_run
//! use vidqa::config::Settings;
//! use vidqa::orchestrator::{flatten, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator
//!         .answer_question("dQw4w9WgXcQ", "What is this video about?")
//!         .await;
//!     println!("{}", flatten(outcome));
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcript;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, VidqaError};
