//! Configuration module for vidqa.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings, IndexMode,
    IndexSettings, PromptSettings, ProviderSettings, RetrievalSettings, ServerSettings, Settings,
    ThresholdType, TranscriptSettings,
};
