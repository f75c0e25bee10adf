//! Configuration settings for vidqa.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub provider: ProviderSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub index: IndexSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidqa".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Connection to the OpenAI-compatible model server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the API (Ollama serves one at `/v1`).
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Verify that the configured models exist before each request.
    pub check_models: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: 300,
            check_models: true,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Requested embedding dimensions (only for models that support it).
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            dimensions: None,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Sampling temperature; the server default when unset.
    pub temperature: Option<f32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            temperature: None,
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption languages to prefer, in order.
    pub preferred_languages: Vec<String>,
    /// Path or name of the yt-dlp binary.
    pub ytdlp_path: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            preferred_languages: vec!["en".to_string()],
            ytdlp_path: "yt-dlp".to_string(),
        }
    }
}

/// How the segmentation boundary threshold is derived from a document's distances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdType {
    /// Distances above the given percentile.
    #[default]
    Percentile,
    /// Distances above mean + amount * standard deviation.
    StandardDeviation,
    /// Distances above mean + amount * interquartile range.
    Interquartile,
    /// Percentile over the gradient of the distances.
    Gradient,
}

impl ThresholdType {
    /// Default amount for this threshold type.
    pub fn default_amount(&self) -> f64 {
        match self {
            ThresholdType::Percentile => 95.0,
            ThresholdType::StandardDeviation => 3.0,
            ThresholdType::Interquartile => 1.5,
            ThresholdType::Gradient => 95.0,
        }
    }
}

impl std::fmt::Display for ThresholdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdType::Percentile => write!(f, "percentile"),
            ThresholdType::StandardDeviation => write!(f, "standard_deviation"),
            ThresholdType::Interquartile => write!(f, "interquartile"),
            ThresholdType::Gradient => write!(f, "gradient"),
        }
    }
}

/// Semantic segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Boundary threshold method.
    pub threshold_type: ThresholdType,
    /// Threshold amount; the method's default when unset.
    pub threshold_amount: Option<f64>,
    /// Neighboring sentences embedded together with each sentence.
    pub buffer_size: usize,
    /// Sentences longer than this are split into word windows.
    pub max_sentence_words: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            threshold_type: ThresholdType::Percentile,
            threshold_amount: None,
            buffer_size: 1,
            max_sentence_words: 60,
        }
    }
}

impl ChunkingSettings {
    /// Threshold amount after applying the per-method default.
    pub fn effective_amount(&self) -> f64 {
        self.threshold_amount
            .unwrap_or_else(|| self.threshold_type.default_amount())
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks passed to the generator.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Where the per-request index lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// In-memory indexes keyed by transcript fingerprint, LRU evicted.
    #[default]
    Cache,
    /// A single SQLite index at a fixed path, destroyed and rebuilt per request.
    Slot,
}

impl std::fmt::Display for IndexMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexMode::Cache => write!(f, "cache"),
            IndexMode::Slot => write!(f, "slot"),
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Index lifecycle (cache, slot).
    pub mode: IndexMode,
    /// Path to the SQLite index (slot mode).
    pub path: String,
    /// Maximum number of cached video indexes (cache mode).
    pub cache_capacity: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            mode: IndexMode::Cache,
            path: "~/.vidqa/index.db".to_string(),
            cache_capacity: 8,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Origins allowed to call the API. A trailing `*` matches any suffix.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost".to_string(),
                "http://localhost:8000".to_string(),
                "chrome-extension://*".to_string(),
            ],
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::VidqaError;

        if self.retrieval.top_k == 0 {
            return Err(VidqaError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.index.cache_capacity == 0 {
            return Err(VidqaError::Config(
                "index.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.chunking.max_sentence_words == 0 {
            return Err(VidqaError::Config(
                "chunking.max_sentence_words must be at least 1".to_string(),
            ));
        }
        if url::Url::parse(&self.provider.api_base).is_err() {
            return Err(VidqaError::Config(format!(
                "provider.api_base is not a valid URL: {}",
                self.provider.api_base
            )));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidqaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite index path.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.index.path)
    }
}
