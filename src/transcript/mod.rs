//! Caption transcript loading.
//!
//! Provides a trait-based interface so the orchestrator can be tested without
//! touching the network.

mod youtube;

pub use youtube::YoutubeTranscriptLoader;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single caption segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in the video (seconds).
    pub start_seconds: f64,
    /// Duration of this segment (seconds).
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: String, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text,
            start_seconds,
            duration_seconds,
        }
    }
}

/// An ordered caption transcript for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTranscript {
    /// Canonical video id.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Ordered caption segments.
    pub segments: Vec<TranscriptSegment>,
}

impl VideoTranscript {
    pub fn new(video_id: String, title: String, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            video_id,
            title,
            segments,
        }
    }

    /// Join all segments into one text body, one caption line per row.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total duration covered by the captions (seconds).
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.start_seconds + s.duration_seconds)
            .unwrap_or(0.0)
    }
}

/// Trait for transcript loading implementations.
#[async_trait]
pub trait TranscriptLoader: Send + Sync {
    /// Load the caption transcript for a video id.
    async fn load(&self, video_id: &str) -> Result<VideoTranscript>;
}
