//! Transcript acquisition.
//!
//! A [`CaptionProvider`] enumerates the caption tracks of a video and fetches
//! their timed segments. [`TranscriptFetcher`] picks a track by language
//! preference and flattens it into one string.

mod youtube;

pub use youtube::{normalize_video_id, parse_json3, YtDlpCaptionProvider};

use crate::error::{Result, UnavailableReason, VidqaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One timed caption unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// A transcript flattened to text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video this transcript belongs to.
    pub video_id: String,
    /// Language code of the track it came from.
    pub language_code: String,
    /// Segment texts joined by single spaces.
    pub text: String,
    /// Number of source segments.
    pub segment_count: usize,
}

impl Transcript {
    /// Build a transcript from segments. Timing is dropped.
    pub fn from_segments(
        video_id: impl Into<String>,
        language_code: impl Into<String>,
        segments: &[TranscriptSegment],
    ) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            video_id: video_id.into(),
            language_code: language_code.into(),
            text,
            segment_count: segments.len(),
        }
    }
}

/// A caption track as enumerated by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code (e.g., "en", "de").
    pub language_code: String,
    /// Human-readable language name, if the provider reports one.
    pub language_name: Option<String>,
    /// Whether the track was generated by speech recognition.
    pub is_generated: bool,
    /// Where to download the track from (provider-specific).
    pub url: Option<String>,
}

impl CaptionTrack {
    pub fn new(language_code: impl Into<String>, is_generated: bool) -> Self {
        Self {
            language_code: language_code.into(),
            language_name: None,
            is_generated,
            url: None,
        }
    }
}

/// Outcome of choosing a caption track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "language", rename_all = "snake_case")]
pub enum LanguageSelection {
    /// A track in one of the preferred languages exists.
    MatchedPreferred(String),
    /// No preferred language; the first enumerated track was used.
    FellBackTo(String),
    /// The video has no tracks at all.
    NoneAvailable,
}

impl std::fmt::Display for LanguageSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageSelection::MatchedPreferred(lang) => write!(f, "{} (preferred)", lang),
            LanguageSelection::FellBackTo(lang) => write!(f, "{} (fallback)", lang),
            LanguageSelection::NoneAvailable => write!(f, "none available"),
        }
    }
}

/// Choose a track: the first preferred language that exists, else the first
/// track in provider order.
///
/// The fallback depends on the provider's enumeration order, which this crate
/// does not control.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    preferred: &[String],
) -> (LanguageSelection, Option<&'a CaptionTrack>) {
    for lang in preferred {
        if let Some(track) = tracks.iter().find(|t| t.language_code == *lang) {
            return (
                LanguageSelection::MatchedPreferred(track.language_code.clone()),
                Some(track),
            );
        }
    }

    match tracks.first() {
        Some(track) => (
            LanguageSelection::FellBackTo(track.language_code.clone()),
            Some(track),
        ),
        None => (LanguageSelection::NoneAvailable, None),
    }
}

/// Source of caption tracks for a video.
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// List the caption tracks of a video, in provider order.
    ///
    /// Errors should be [`VidqaError::TranscriptUnavailable`] with the matching reason.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Fetch the timed segments of a track.
    async fn fetch_segments(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSegment>>;
}

/// A fetched transcript together with how its track was chosen.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedTranscript {
    pub transcript: Transcript,
    pub selection: LanguageSelection,
}

/// Resolves a video id to a transcript string.
pub struct TranscriptFetcher {
    provider: Arc<dyn CaptionProvider>,
    preferred_languages: Vec<String>,
}

impl TranscriptFetcher {
    pub fn new(provider: Arc<dyn CaptionProvider>, preferred_languages: Vec<String>) -> Self {
        Self {
            provider,
            preferred_languages,
        }
    }

    /// Fetch the transcript of a video. Every failure is a
    /// [`VidqaError::TranscriptUnavailable`]; nothing is retried.
    #[instrument(skip(self))]
    pub async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        let result = self.fetch_inner(video_id).await;

        if let Err(VidqaError::TranscriptUnavailable(reason)) = &result {
            warn!(reason = reason.code(), "Transcript unavailable for {}: {}", video_id, reason);
        }

        result
    }

    async fn fetch_inner(&self, video_id: &str) -> Result<FetchedTranscript> {
        let tracks = self
            .provider
            .list_tracks(video_id)
            .await
            .map_err(into_unavailable)?;

        let (selection, track) = select_track(&tracks, &self.preferred_languages);
        let track = track.ok_or(UnavailableReason::NoTrack)?;
        info!("Caption track for {}: {}", video_id, selection);

        let segments = self
            .provider
            .fetch_segments(video_id, track)
            .await
            .map_err(into_unavailable)?;

        Ok(FetchedTranscript {
            transcript: Transcript::from_segments(video_id, &track.language_code, &segments),
            selection,
        })
    }
}

/// Collapse any provider error into an unavailable-transcript error.
fn into_unavailable(error: VidqaError) -> VidqaError {
    match error {
        VidqaError::TranscriptUnavailable(_) => error,
        other => VidqaError::TranscriptUnavailable(UnavailableReason::Retrieval(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticCaptionProvider;

    fn track(lang: &str) -> CaptionTrack {
        CaptionTrack::new(lang, false)
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_select_prefers_english_even_when_listed_last() {
        let tracks = vec![track("es"), track("de"), track("en")];
        let (selection, chosen) = select_track(&tracks, &langs(&["en"]));

        assert_eq!(selection, LanguageSelection::MatchedPreferred("en".to_string()));
        assert_eq!(chosen.unwrap().language_code, "en");
    }

    #[test]
    fn test_select_respects_preference_order() {
        let tracks = vec![track("fr"), track("de")];
        let (selection, _) = select_track(&tracks, &langs(&["en", "de", "fr"]));
        assert_eq!(selection, LanguageSelection::MatchedPreferred("de".to_string()));
    }

    #[test]
    fn test_select_falls_back_to_first_track() {
        let tracks = vec![track("ja"), track("ko")];
        let (selection, chosen) = select_track(&tracks, &langs(&["en"]));

        assert_eq!(selection, LanguageSelection::FellBackTo("ja".to_string()));
        assert_eq!(chosen.unwrap().language_code, "ja");
    }

    #[test]
    fn test_select_none_available() {
        let (selection, chosen) = select_track(&[], &langs(&["en"]));
        assert_eq!(selection, LanguageSelection::NoneAvailable);
        assert!(chosen.is_none());
        assert_eq!(selection.to_string(), "none available");
    }

    #[test]
    fn test_transcript_joins_with_single_space() {
        let segments = vec![
            TranscriptSegment::new("Hello world", 0.0, 2.0),
            TranscriptSegment::new("this is a test", 2.0, 3.0),
        ];
        let transcript = Transcript::from_segments("vid", "en", &segments);

        assert_eq!(transcript.text, "Hello world this is a test");
        assert_eq!(transcript.segment_count, 2);
    }

    #[tokio::test]
    async fn test_fetch_returns_english_track() {
        let provider = StaticCaptionProvider::new()
            .with_track("s3p2EoAzhtE", "es", &["Hola a todos."])
            .with_track("s3p2EoAzhtE", "de", &["Hallo zusammen."])
            .with_track("s3p2EoAzhtE", "en", &["Hello everyone.", "Welcome back."]);
        let fetcher = TranscriptFetcher::new(Arc::new(provider), langs(&["en"]));

        let fetched = fetcher.fetch("s3p2EoAzhtE").await.unwrap();

        assert_eq!(
            fetched.selection,
            LanguageSelection::MatchedPreferred("en".to_string())
        );
        assert_eq!(fetched.transcript.text, "Hello everyone. Welcome back.");
        assert_eq!(fetched.transcript.language_code, "en");
    }

    #[tokio::test]
    async fn test_fetch_falls_back() {
        let provider = StaticCaptionProvider::new()
            .with_track("vid", "pt", &["Olá."])
            .with_track("vid", "it", &["Ciao."]);
        let fetcher = TranscriptFetcher::new(Arc::new(provider), langs(&["en"]));

        let fetched = fetcher.fetch("vid").await.unwrap();
        assert_eq!(fetched.selection, LanguageSelection::FellBackTo("pt".to_string()));
        assert_eq!(fetched.transcript.text, "Olá.");
    }

    #[tokio::test]
    async fn test_fetch_disabled() {
        let provider = StaticCaptionProvider::new().with_disabled("vid");
        let fetcher = TranscriptFetcher::new(Arc::new(provider), langs(&["en"]));

        let err = fetcher.fetch("vid").await.unwrap_err();
        assert!(matches!(
            err,
            VidqaError::TranscriptUnavailable(UnavailableReason::CaptionsDisabled)
        ));
    }

    #[tokio::test]
    async fn test_fetch_unknown_video_has_no_track() {
        let fetcher = TranscriptFetcher::new(Arc::new(StaticCaptionProvider::new()), langs(&["en"]));

        let err = fetcher.fetch("missing").await.unwrap_err();
        assert!(matches!(
            err,
            VidqaError::TranscriptUnavailable(UnavailableReason::NoTrack)
        ));
    }

    #[tokio::test]
    async fn test_fetch_collapses_other_errors_into_retrieval() {
        let provider = StaticCaptionProvider::new().with_failure("vid", "connection reset");
        let fetcher = TranscriptFetcher::new(Arc::new(provider), langs(&["en"]));

        let err = fetcher.fetch("vid").await.unwrap_err();
        match err {
            VidqaError::TranscriptUnavailable(UnavailableReason::Retrieval(msg)) => {
                assert!(msg.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
