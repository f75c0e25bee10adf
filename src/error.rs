//! Error types for vidqa.

use thiserror::Error;

/// Why a transcript could not be obtained.
///
/// All variants surface identically at the pipeline boundary; the reason code
/// only shows up in logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    #[error("captions are disabled for this video")]
    CaptionsDisabled,

    #[error("no usable caption track")]
    NoTrack,

    #[error("could not retrieve transcript: {0}")]
    Retrieval(String),
}

impl UnavailableReason {
    /// Stable reason code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            UnavailableReason::CaptionsDisabled => "captions_disabled",
            UnavailableReason::NoTrack => "no_track",
            UnavailableReason::Retrieval(_) => "retrieval_failed",
        }
    }
}

/// Library-level error type for vidqa operations.
#[derive(Error, Debug)]
pub enum VidqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(UnavailableReason),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<UnavailableReason> for VidqaError {
    fn from(reason: UnavailableReason) -> Self {
        VidqaError::TranscriptUnavailable(reason)
    }
}

/// Result type alias for vidqa operations.
pub type Result<T> = std::result::Result<T, VidqaError>;
