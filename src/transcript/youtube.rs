//! YouTube caption loader.
//!
//! Uses yt-dlp for metadata and caption track discovery, then fetches the
//! track payload (json3 format) over HTTP.

use super::{TranscriptLoader, TranscriptSegment, VideoTranscript};
use crate::error::{Result, SmakError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Timeout for caption payload fetches.
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Caption transcript loader backed by yt-dlp.
pub struct YoutubeTranscriptLoader {
    client: reqwest::Client,
    /// Preferred caption languages, in priority order.
    languages: Vec<String>,
}

impl YoutubeTranscriptLoader {
    pub fn new() -> Self {
        Self::with_languages(vec!["en".to_string()])
    }

    pub fn with_languages(languages: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, languages }
    }

    /// Fetch video metadata and caption track listing via yt-dlp.
    async fn fetch_video_info(&self, video_id: &str) -> Result<serde_json::Value> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SmakError::ToolNotFound("yt-dlp".to_string())
                } else {
                    SmakError::Transcript(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SmakError::ContentUnavailable(format!(
                "Video {} is not available: {}",
                video_id,
                stderr.trim()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&json_str)
            .map_err(|e| SmakError::Transcript(format!("Failed to parse yt-dlp output: {}", e)))
    }

    /// Fetch and parse a json3 caption payload.
    async fn fetch_caption_track(&self, track_url: &str) -> Result<Vec<TranscriptSegment>> {
        let payload: CaptionPayload = self
            .client
            .get(track_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let segments = payload
            .events
            .into_iter()
            .filter_map(|event| {
                let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
                let text = text.trim().to_string();
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
}

impl Default for YoutubeTranscriptLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptLoader for YoutubeTranscriptLoader {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn load(&self, video_id: &str) -> Result<VideoTranscript> {
        let info = self.fetch_video_info(video_id).await?;

        let title = info["title"].as_str().unwrap_or("Unknown Title").to_string();

        let track_url = select_caption_track(&info, &self.languages).ok_or_else(|| {
            SmakError::ContentUnavailable(format!(
                "Video {} has no caption tracks in languages {:?}",
                video_id, self.languages
            ))
        })?;

        debug!("Fetching caption track for {}", video_id);
        let segments = self.fetch_caption_track(&track_url).await?;
        debug!("Loaded {} caption segments", segments.len());

        Ok(VideoTranscript::new(video_id.to_string(), title, segments))
    }
}

/// Pick a caption track URL from yt-dlp's `subtitles` / `automatic_captions`
/// listings. Manual subtitles win over automatic ones; within a track list, a
/// native json3 format wins over rewriting the format query parameter.
fn select_caption_track(info: &serde_json::Value, languages: &[String]) -> Option<String> {
    for source in ["subtitles", "automatic_captions"] {
        let tracks = match info[source].as_object() {
            Some(t) => t,
            None => continue,
        };

        for lang in languages {
            // Exact language key, or a regional variant like "en-US".
            let formats = tracks.get(lang).or_else(|| {
                tracks
                    .iter()
                    .find(|(key, _)| key.starts_with(&format!("{}-", lang)))
                    .map(|(_, v)| v)
            });

            let formats = match formats.and_then(|f| f.as_array()) {
                Some(f) if !f.is_empty() => f,
                _ => continue,
            };

            if let Some(url) = formats
                .iter()
                .find(|f| f["ext"].as_str() == Some("json3"))
                .and_then(|f| f["url"].as_str())
            {
                return Some(url.to_string());
            }

            if let Some(url) = formats[0]["url"].as_str() {
                return Some(format!("{}&fmt=json3", url));
            }
        }
    }

    None
}

/// json3 caption payload shape.
#[derive(Debug, Deserialize)]
struct CaptionPayload {
    #[serde(default)]
    events: Vec<CaptionEvent>,
}

#[derive(Debug, Deserialize)]
struct CaptionEvent {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<CaptionSeg>,
}

#[derive(Debug, Deserialize)]
struct CaptionSeg {
    #[serde(default)]
    utf8: String,
}
