//! Text generation capability used to answer questions.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Maps a prompt to a response, one call per question, no streaming.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a response for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Confirm the generation model can be used.
    async fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Name of the generation model.
    fn model(&self) -> &str;
}
