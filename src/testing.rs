//! In-process fakes for the external capabilities.

use crate::embedding::Embedder;
use crate::error::{Result, UnavailableReason, VidqaError};
use crate::generation::Generator;
use crate::transcript::{CaptionProvider, CaptionTrack, TranscriptSegment};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Each dimension counts occurrences of one vocabulary word, so texts about
/// the same words land close together.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    calls: AtomicUsize,
    fail_batches: bool,
    fail_queries: bool,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
            fail_batches: false,
            fail_queries: false,
        }
    }

    /// Make `embed_batch` fail (segmentation and indexing).
    pub fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    /// Make `embed` fail (question embedding).
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Number of embed or embed_batch calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        self.vocabulary
            .iter()
            .map(|word| tokens.iter().filter(|t| **t == word.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(VidqaError::Embedding("query embedding refused".to_string()));
        }
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches {
            return Err(VidqaError::Embedding("batch embedding refused".to_string()));
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn model(&self) -> &str {
        "keyword"
    }
}

/// Generator that echoes its prompt, or answers with a fixed response.
pub struct EchoGenerator {
    response: Option<String>,
    failure: Option<String>,
    unavailable: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self {
            response: None,
            failure: None,
            unavailable: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_response(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            ..Self::new()
        }
    }

    /// Every `generate` call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// `check_ready` fails with `message`.
    pub fn unavailable(message: &str) -> Self {
        Self {
            unavailable: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        if let Some(message) = &self.failure {
            return Err(VidqaError::Generation(message.clone()));
        }
        Ok(self.response.clone().unwrap_or_else(|| prompt.to_string()))
    }

    async fn check_ready(&self) -> Result<()> {
        match &self.unavailable {
            Some(message) => Err(VidqaError::ModelUnavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn model(&self) -> &str {
        "echo"
    }
}

enum VideoCaptions {
    Tracks(Vec<(String, Vec<String>)>),
    Disabled,
    Failure(String),
}

/// Caption provider serving canned tracks per video.
///
/// Unknown videos have no tracks.
pub struct StaticCaptionProvider {
    videos: HashMap<String, VideoCaptions>,
}

impl StaticCaptionProvider {
    pub fn new() -> Self {
        Self {
            videos: HashMap::new(),
        }
    }

    /// Add a track; tracks are listed in the order they were added.
    pub fn with_track(mut self, video_id: &str, language_code: &str, segments: &[&str]) -> Self {
        let segments = segments.iter().map(|s| s.to_string()).collect();
        match self.videos.get_mut(video_id) {
            Some(VideoCaptions::Tracks(tracks)) => {
                tracks.push((language_code.to_string(), segments));
            }
            _ => {
                self.videos.insert(
                    video_id.to_string(),
                    VideoCaptions::Tracks(vec![(language_code.to_string(), segments)]),
                );
            }
        }
        self
    }

    pub fn with_disabled(mut self, video_id: &str) -> Self {
        self.videos.insert(video_id.to_string(), VideoCaptions::Disabled);
        self
    }

    /// Listing tracks fails with a transport error carrying `message`.
    pub fn with_failure(mut self, video_id: &str, message: &str) -> Self {
        self.videos
            .insert(video_id.to_string(), VideoCaptions::Failure(message.to_string()));
        self
    }
}

#[async_trait]
impl CaptionProvider for StaticCaptionProvider {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        match self.videos.get(video_id) {
            None => Ok(Vec::new()),
            Some(VideoCaptions::Disabled) => Err(UnavailableReason::CaptionsDisabled.into()),
            Some(VideoCaptions::Failure(message)) => Err(VidqaError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message.clone(),
            ))),
            Some(VideoCaptions::Tracks(tracks)) => Ok(tracks
                .iter()
                .map(|(lang, _)| CaptionTrack::new(lang.clone(), false))
                .collect()),
        }
    }

    async fn fetch_segments(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSegment>> {
        let Some(VideoCaptions::Tracks(tracks)) = self.videos.get(video_id) else {
            return Err(UnavailableReason::NoTrack.into());
        };

        let (_, segments) = tracks
            .iter()
            .find(|(lang, _)| *lang == track.language_code)
            .ok_or(UnavailableReason::NoTrack)?;

        Ok(segments
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptSegment::new(text.clone(), i as f64, 1.0))
            .collect())
    }
}
