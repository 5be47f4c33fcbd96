//! Video reference parsing and collection naming.
//!
//! A request arrives with a raw YouTube link; everything downstream works
//! with the canonical 11-character video id extracted here.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Prefix for vector store collections holding one video's transcript.
pub const COLLECTION_PREFIX: &str = "youtube_";

static ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn id_regex() -> &'static Regex {
    ID_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"))
}

/// A validated reference to a YouTube video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    video_id: String,
}

impl VideoReference {
    /// Parse a YouTube URL or bare video id.
    ///
    /// Supported shapes: `watch?v=ID`, `youtu.be/ID`, `embed/ID`, `/v/ID`,
    /// `shorts/ID`, and a bare 11-character id. Returns `None` when no
    /// canonical id can be extracted.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if id_regex().is_match(trimmed) {
            return Some(Self {
                video_id: trimmed.to_string(),
            });
        }

        let url = Url::parse(trimmed)
            .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
            .ok()?;

        let host = url.host_str()?;
        let candidate = if host.ends_with("youtu.be") {
            url.path_segments()?.next().map(str::to_string)
        } else if host.ends_with("youtube.com") {
            let segments: Vec<&str> = url.path_segments()?.collect();
            match segments.first() {
                Some(&"watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some(&"embed") | Some(&"v") | Some(&"shorts") => {
                    segments.get(1).map(|s| s.to_string())
                }
                _ => None,
            }
        } else {
            None
        }?;

        if id_regex().is_match(&candidate) {
            Some(Self {
                video_id: candidate,
            })
        } else {
            None
        }
    }

    /// The canonical 11-character video id.
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Deterministic vector store collection name for this video.
    pub fn collection_name(&self) -> String {
        format!("{}{}", COLLECTION_PREFIX, self.video_id)
    }

    /// Canonical watch URL.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.video_id)
    }
}
