//! Pipeline orchestrator for vidqa.
//!
//! Coordinates one question from transcript fetch to generated answer:
//! fetch, segment and index the transcript, retrieve the closest chunks,
//! then generate a grounded answer. Every stage failure ends the request
//! with a [`PipelineFailure`] that names the stage.

use crate::chunking::{Chunker, SemanticChunker};
use crate::config::{IndexMode, Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, VidqaError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::rag::{AnswerGenerator, ContextChunk, Retriever};
use crate::transcript::{
    normalize_video_id, CaptionProvider, FetchedTranscript, LanguageSelection, TranscriptFetcher,
    YtDlpCaptionProvider,
};
use crate::vector_store::{fingerprint, Document, IndexCache, MemoryIndex, SqliteIndex};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

/// Shown when either input is blank.
pub const MISSING_INPUT_MESSAGE: &str = "Please enter both Video ID and a question.";

/// Shown for every transcript failure, whatever the cause.
pub const TRANSCRIPT_UNAVAILABLE_MESSAGE: &str =
    "Transcript not found or unavailable for this video. Please check video ID or try another video.";

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    FetchingTranscript,
    RebuildingIndex,
    Retrieving,
    Generating,
    Done,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    ModelLoad,
    TranscriptUnavailable,
    Indexing,
    Retrieval,
    Generation,
}

impl FailureKind {
    /// The stage in which this kind of failure happens.
    pub fn stage(&self) -> Stage {
        match self {
            FailureKind::InvalidInput | FailureKind::ModelLoad => Stage::Idle,
            FailureKind::TranscriptUnavailable => Stage::FetchingTranscript,
            FailureKind::Indexing => Stage::RebuildingIndex,
            FailureKind::Retrieval => Stage::Retrieving,
            FailureKind::Generation => Stage::Generating,
        }
    }
}

/// A terminal pipeline failure with its user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineFailure {
    pub kind: FailureKind,
    pub stage: Stage,
    pub message: String,
}

impl PipelineFailure {
    fn new(kind: FailureKind, message: String) -> Self {
        Self {
            kind,
            stage: kind.stage(),
            message,
        }
    }

    fn invalid_input() -> Self {
        Self::new(FailureKind::InvalidInput, MISSING_INPUT_MESSAGE.to_string())
    }

    fn model_load(error: VidqaError) -> Self {
        Self::new(
            FailureKind::ModelLoad,
            format!("Failed to load Ollama model: {}", error),
        )
    }

    fn transcript_unavailable() -> Self {
        Self::new(
            FailureKind::TranscriptUnavailable,
            TRANSCRIPT_UNAVAILABLE_MESSAGE.to_string(),
        )
    }

    fn indexing(error: VidqaError) -> Self {
        Self::new(
            FailureKind::Indexing,
            format!("Error while indexing transcript: {}", error),
        )
    }

    fn retrieval(error: VidqaError) -> Self {
        Self::new(FailureKind::Retrieval, format!("Error during retrieval: {}", error))
    }

    fn generation(error: VidqaError) -> Self {
        Self::new(FailureKind::Generation, format!("Error during answering: {}", error))
    }

    /// The message shown in place of an answer.
    pub fn into_message(self) -> String {
        self.message
    }
}

impl std::fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PipelineFailure {}

/// A generated answer and what it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Raw generator output.
    pub text: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<ContextChunk>,
    /// Which caption track was used.
    pub selection: LanguageSelection,
    /// Whether the index was served from the cache.
    pub cache_hit: bool,
}

/// Chunks retrieved for a question, before generation.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub video_id: String,
    pub chunks: Vec<ContextChunk>,
    pub selection: LanguageSelection,
    pub cache_hit: bool,
}

pub type PipelineOutcome = std::result::Result<Answer, PipelineFailure>;

/// Collapse an outcome into the single string shown to users: the answer
/// text, or the failure message.
pub fn flatten(outcome: PipelineOutcome) -> String {
    match outcome {
        Ok(answer) => answer.text,
        Err(failure) => failure.into_message(),
    }
}

/// Index lifecycle, per [`IndexMode`].
enum IndexStore {
    Cache(IndexCache),
    /// The single slot is held locked from rebuild through retrieval.
    Slot {
        path: PathBuf,
        current: Mutex<Option<SqliteIndex>>,
    },
}

/// The main orchestrator for the vidqa pipeline.
pub struct Orchestrator {
    settings: Settings,
    fetcher: TranscriptFetcher,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    chunker: SemanticChunker,
    retriever: Retriever,
    answerer: AnswerGenerator,
    store: IndexStore,
    models_ready: OnceCell<()>,
}

impl Orchestrator {
    /// Create an orchestrator backed by yt-dlp and the configured model API.
    pub fn new(settings: Settings) -> Result<Self> {
        let provider: Arc<dyn CaptionProvider> =
            Arc::new(YtDlpCaptionProvider::new(&settings.transcript.ytdlp_path));
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::new(&settings.provider, &settings.embedding)?);
        let generator: Arc<dyn Generator> =
            Arc::new(OpenAIGenerator::new(&settings.provider, &settings.generation)?);

        info!(
            "Using {} for embeddings and {} for answers via {}",
            embedder.model(),
            generator.model(),
            settings.provider.api_base
        );

        Self::with_components(settings, provider, embedder, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        provider: Arc<dyn CaptionProvider>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        debug!("Index mode: {}", settings.index.mode);
        let store = match settings.index.mode {
            IndexMode::Cache => IndexStore::Cache(IndexCache::new(settings.index.cache_capacity)),
            IndexMode::Slot => IndexStore::Slot {
                path: settings.index_path(),
                current: Mutex::new(None),
            },
        };

        Ok(Self {
            fetcher: TranscriptFetcher::new(provider, settings.transcript.preferred_languages.clone()),
            chunker: SemanticChunker::new(embedder.clone(), settings.chunking.clone()),
            retriever: Retriever::new(embedder.clone(), settings.retrieval.top_k),
            answerer: AnswerGenerator::new(generator.clone()).with_prompts(prompts),
            embedder,
            generator,
            store,
            models_ready: OnceCell::new(),
            settings,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Answer a question about a video.
    #[instrument(skip(self, question))]
    pub async fn answer_question(&self, video_id: &str, question: &str) -> PipelineOutcome {
        let retrieval = self.retrieve(video_id, question).await?;

        debug!(stage = ?Stage::Generating, "Generating answer");
        let text = self
            .answerer
            .generate(question.trim(), &retrieval.chunks)
            .await
            .map_err(|e| {
                warn!("Generation failed: {}", e);
                PipelineFailure::generation(e)
            })?;

        debug!(stage = ?Stage::Done, "Answered question for {}", retrieval.video_id);
        Ok(Answer {
            text,
            sources: retrieval.chunks,
            selection: retrieval.selection,
            cache_hit: retrieval.cache_hit,
        })
    }

    /// Run the pipeline up to retrieval, without generating an answer.
    #[instrument(skip(self, question))]
    pub async fn retrieve(
        &self,
        video_id: &str,
        question: &str,
    ) -> std::result::Result<Retrieval, PipelineFailure> {
        let video_id = normalize_video_id(video_id);
        let question = question.trim();
        if video_id.is_empty() || question.is_empty() {
            return Err(PipelineFailure::invalid_input());
        }

        self.ensure_models_ready().await.map_err(|e| {
            warn!("Model check failed: {}", e);
            PipelineFailure::model_load(e)
        })?;

        debug!(stage = ?Stage::FetchingTranscript, "Fetching transcript for {}", video_id);
        let fetched = self
            .fetcher
            .fetch(&video_id)
            .await
            .map_err(|_| PipelineFailure::transcript_unavailable())?;

        let (chunks, cache_hit) = match &self.store {
            IndexStore::Cache(cache) => {
                let (index, cache_hit) = self
                    .cached_index(cache, &video_id, &fetched)
                    .await
                    .map_err(PipelineFailure::indexing)?;

                debug!(stage = ?Stage::Retrieving, "Retrieving context");
                let chunks = self
                    .retriever
                    .search(index.as_ref(), question)
                    .await
                    .map_err(PipelineFailure::retrieval)?;
                (chunks, cache_hit)
            }
            IndexStore::Slot { path, current } => {
                let mut slot = current.lock().await;
                // Close the previous index, then delete it before any new work
                *slot = None;
                SqliteIndex::clear(path).map_err(PipelineFailure::indexing)?;

                debug!(stage = ?Stage::RebuildingIndex, "Rebuilding index at {:?}", path);
                let docs = self
                    .build_documents(&fetched)
                    .await
                    .map_err(PipelineFailure::indexing)?;
                let text_fingerprint = fingerprint(&video_id, &fetched.transcript.text);
                let index = SqliteIndex::rebuild(path, &video_id, &text_fingerprint, &docs)
                    .map_err(PipelineFailure::indexing)?;
                let index = slot.insert(index);

                debug!(stage = ?Stage::Retrieving, "Retrieving context");
                let chunks = self
                    .retriever
                    .search(&*index, question)
                    .await
                    .map_err(PipelineFailure::retrieval)?;
                (chunks, false)
            }
        };

        Ok(Retrieval {
            video_id,
            chunks,
            selection: fetched.selection,
            cache_hit,
        })
    }

    /// Fetch a transcript on its own.
    pub async fn fetch_transcript(&self, video_id: &str) -> Result<FetchedTranscript> {
        let video_id = normalize_video_id(video_id);
        if video_id.is_empty() {
            return Err(VidqaError::InvalidInput("Video ID is empty".to_string()));
        }
        self.fetcher.fetch(&video_id).await
    }

    /// Confirm both models exist. Success is remembered; failures are retried
    /// on the next request.
    async fn ensure_models_ready(&self) -> Result<()> {
        if !self.settings.provider.check_models {
            return Ok(());
        }

        self.models_ready
            .get_or_try_init(|| async {
                self.embedder.check_ready().await?;
                self.generator.check_ready().await?;
                info!("Models ready");
                Ok::<(), VidqaError>(())
            })
            .await?;
        Ok(())
    }

    /// Look up the transcript's index, building and caching it on a miss.
    async fn cached_index(
        &self,
        cache: &IndexCache,
        video_id: &str,
        fetched: &FetchedTranscript,
    ) -> Result<(Arc<MemoryIndex>, bool)> {
        let key = fingerprint(video_id, &fetched.transcript.text);

        if let Some(index) = cache.get(&key)? {
            debug!("Index cache hit for {}", video_id);
            return Ok((index, true));
        }

        debug!(stage = ?Stage::RebuildingIndex, "Index cache miss for {}", video_id);
        let docs = self.build_documents(fetched).await?;
        let index = Arc::new(MemoryIndex::new(video_id, docs));
        cache.insert(key, index.clone())?;
        Ok((index, false))
    }

    /// Segment the transcript and embed every chunk.
    async fn build_documents(&self, fetched: &FetchedTranscript) -> Result<Vec<Document>> {
        let chunks = self.chunker.chunk(&fetched.transcript.text).await?;
        if chunks.is_empty() {
            warn!("Transcript for {} is empty", fetched.transcript.video_id);
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(VidqaError::Embedding(format!(
                "Expected {} chunk embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        info!("Indexing {} chunks", chunks.len());
        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::new(chunk, embedding))
            .collect())
    }
}
