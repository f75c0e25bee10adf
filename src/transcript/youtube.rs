//! YouTube captions via yt-dlp.
//!
//! yt-dlp lists the caption tracks of a video (`subtitles` for uploaded
//! tracks, `automatic_captions` for speech recognition). Each track is then
//! downloaded in YouTube's `json3` timed-text format.

use super::{CaptionProvider, CaptionTrack, TranscriptSegment};
use crate::error::{Result, UnavailableReason, VidqaError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, instrument};

const CAPTION_FORMAT: &str = "json3";
const ORIGINAL_SUFFIX: &str = "-orig";

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            ",
        )
        .expect("video id pattern is valid")
    })
}

/// Extract the video id from a YouTube URL; anything else is returned trimmed.
pub fn normalize_video_id(input: &str) -> String {
    let input = input.trim();
    video_id_regex()
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}

/// Caption provider that shells out to yt-dlp and downloads `json3` tracks.
pub struct YtDlpCaptionProvider {
    ytdlp_path: String,
    http: reqwest::Client,
}

impl YtDlpCaptionProvider {
    pub fn new(ytdlp_path: &str) -> Self {
        Self {
            ytdlp_path: ytdlp_path.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Run yt-dlp and return its JSON description of the video.
    async fn dump_video_json(&self, video_id: &str) -> Result<serde_json::Value> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VidqaError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    VidqaError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UnavailableReason::Retrieval(format!(
                "yt-dlp failed for {}: {}",
                video_id,
                stderr.trim()
            ))
            .into());
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&json_str).map_err(|e| {
            UnavailableReason::Retrieval(format!("Failed to parse yt-dlp output: {}", e)).into()
        })
    }
}

impl Default for YtDlpCaptionProvider {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl CaptionProvider for YtDlpCaptionProvider {
    #[instrument(skip(self))]
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let json = self.dump_video_json(video_id).await?;
        let tracks = tracks_from_info(&json)?;
        debug!("Found {} caption tracks for {}", tracks.len(), video_id);
        Ok(tracks)
    }

    #[instrument(skip(self, track), fields(language = %track.language_code))]
    async fn fetch_segments(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSegment>> {
        let url = track.url.as_deref().ok_or(UnavailableReason::NoTrack)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UnavailableReason::Retrieval(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| UnavailableReason::Retrieval(e.to_string()))?;

        let segments = parse_json3(&body)?;
        debug!("Fetched {} caption segments for {}", segments.len(), video_id);
        Ok(segments)
    }
}

#[derive(Debug, Deserialize)]
struct CaptionFormat {
    ext: String,
    url: String,
    #[serde(default)]
    name: Option<String>,
}

/// Read the caption tracks out of yt-dlp's video JSON.
///
/// Uploaded tracks come first, then generated ones. When yt-dlp marks the
/// original speech-recognition language with `-orig`, only those generated
/// tracks are kept, which drops machine translations.
fn tracks_from_info(info: &serde_json::Value) -> Result<Vec<CaptionTrack>> {
    let manual = caption_map(info, "subtitles")?;
    let automatic = caption_map(info, "automatic_captions")?;

    if manual.is_empty() && automatic.is_empty() {
        return Err(UnavailableReason::CaptionsDisabled.into());
    }

    let has_original = automatic.iter().any(|(lang, _)| lang.ends_with(ORIGINAL_SUFFIX));
    let automatic = automatic.into_iter().filter_map(|(lang, formats)| {
        if !has_original {
            return Some((lang, formats));
        }
        lang.strip_suffix(ORIGINAL_SUFFIX)
            .map(|base| (base.to_string(), formats))
    });

    let mut tracks = Vec::new();
    let entries = manual
        .into_iter()
        .map(|(lang, formats)| (lang, formats, false))
        .chain(automatic.map(|(lang, formats)| (lang, formats, true)));

    for (language_code, formats, is_generated) in entries {
        // yt-dlp lists "live_chat" as a subtitle track on streams
        if language_code == "live_chat" {
            continue;
        }
        if let Some(format) = formats.into_iter().find(|f| f.ext == CAPTION_FORMAT) {
            tracks.push(CaptionTrack {
                language_code,
                language_name: format.name,
                is_generated,
                url: Some(format.url),
            });
        }
    }

    if tracks.is_empty() {
        return Err(UnavailableReason::NoTrack.into());
    }

    Ok(tracks)
}

/// Caption entries under `key`, in the order yt-dlp wrote them.
fn caption_map(info: &serde_json::Value, key: &str) -> Result<Vec<(String, Vec<CaptionFormat>)>> {
    let Some(map) = info.get(key).and_then(|v| v.as_object()) else {
        return Ok(Vec::new());
    };

    map.iter()
        .map(|(lang, formats)| {
            let formats: Vec<CaptionFormat> = serde_json::from_value(formats.clone())
                .map_err(|e| {
                    UnavailableReason::Retrieval(format!("Malformed caption list: {}", e))
                })?;
            Ok((lang.clone(), formats))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` timed-text document into segments.
///
/// Events without text (window setup, line breaks) are skipped.
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: Json3 = serde_json::from_str(body).map_err(|e| {
        UnavailableReason::Retrieval(format!("Malformed caption track: {}", e))
    })?;

    let segments = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(
                text,
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_video_id() {
        assert_eq!(
            normalize_video_id("https://www.youtube.com/watch?v=s3p2EoAzhtE"),
            "s3p2EoAzhtE"
        );
        assert_eq!(
            normalize_video_id("https://www.youtube.com/watch?feature=share&v=s3p2EoAzhtE"),
            "s3p2EoAzhtE"
        );
        assert_eq!(normalize_video_id("https://youtu.be/s3p2EoAzhtE"), "s3p2EoAzhtE");
        assert_eq!(normalize_video_id("  s3p2EoAzhtE "), "s3p2EoAzhtE");
        assert_eq!(normalize_video_id("not-a-url"), "not-a-url");
    }

    #[test]
    fn test_tracks_manual_before_generated() {
        let info = json!({
            "subtitles": {
                "de": [{"ext": "vtt", "url": "https://x/de.vtt"}, {"ext": "json3", "url": "https://x/de.json3", "name": "German"}]
            },
            "automatic_captions": {
                "en": [{"ext": "json3", "url": "https://x/en.json3"}]
            }
        });

        let tracks = tracks_from_info(&info).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language_code, "de");
        assert!(!tracks[0].is_generated);
        assert_eq!(tracks[0].language_name.as_deref(), Some("German"));
        assert_eq!(tracks[0].url.as_deref(), Some("https://x/de.json3"));
        assert_eq!(tracks[1].language_code, "en");
        assert!(tracks[1].is_generated);
    }

    #[test]
    fn test_tracks_keep_only_original_generated_language() {
        let info = json!({
            "automatic_captions": {
                "af": [{"ext": "json3", "url": "https://x/af"}],
                "en": [{"ext": "json3", "url": "https://x/en"}],
                "en-orig": [{"ext": "json3", "url": "https://x/en-orig"}]
            }
        });

        let tracks = tracks_from_info(&info).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language_code, "en");
        assert_eq!(tracks[0].url.as_deref(), Some("https://x/en-orig"));
    }

    #[test]
    fn test_no_captions_means_disabled() {
        let info = json!({"subtitles": {}, "automatic_captions": {}});
        let err = tracks_from_info(&info).unwrap_err();
        assert!(matches!(
            err,
            VidqaError::TranscriptUnavailable(UnavailableReason::CaptionsDisabled)
        ));

        let err = tracks_from_info(&json!({"title": "x"})).unwrap_err();
        assert!(matches!(
            err,
            VidqaError::TranscriptUnavailable(UnavailableReason::CaptionsDisabled)
        ));
    }

    #[test]
    fn test_tracks_without_json3_are_no_track() {
        let info = json!({
            "subtitles": {
                "en": [{"ext": "vtt", "url": "https://x/en.vtt"}],
                "live_chat": [{"ext": "json3", "url": "https://x/chat"}]
            }
        });
        let err = tracks_from_info(&info).unwrap_err();
        assert!(matches!(
            err,
            VidqaError::TranscriptUnavailable(UnavailableReason::NoTrack)
        ));
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 100000, "id": 1, "wpWinPosId": 1},
                {"tStartMs": 1200, "dDurationMs": 3400, "segs": [{"utf8": "This video"}, {"utf8": " explains"}]},
                {"tStartMs": 4600, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 4600, "dDurationMs": 2000, "segs": [{"utf8": "photosynthesis\nin plants."}]}
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "This video explains");
        assert!((segments[0].start - 1.2).abs() < 1e-9);
        assert!((segments[0].duration - 3.4).abs() < 1e-9);
        assert_eq!(segments[1].text, "photosynthesis in plants.");
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        let err = parse_json3("<html>").unwrap_err();
        assert!(matches!(
            err,
            VidqaError::TranscriptUnavailable(UnavailableReason::Retrieval(_))
        ));
    }
}
