//! Transcript chunking.
//!
//! Splits transcript text into bounded, overlapping windows sized for
//! embedding and context limits.

mod splitter;

pub use splitter::{RecursiveSplitter, SplitterConfig};

use crate::transcript::VideoTranscript;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Canonical video id the chunk came from.
    pub source: String,
    /// Video title.
    pub title: String,
    /// Order of this chunk within the transcript.
    pub chunk_order: i32,
    /// When the chunk was produced.
    pub indexed_at: DateTime<Utc>,
}

impl ChunkMetadata {
    /// Convert to the flat JSON map shape the vector store expects.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// A chunk of transcript text ready for embedding and storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Chunk metadata.
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(content: String, metadata: ChunkMetadata) -> Self {
        Self { content, metadata }
    }
}

/// Split a transcript into document chunks with per-chunk metadata.
pub fn chunk_transcript(
    transcript: &VideoTranscript,
    splitter: &RecursiveSplitter,
) -> Vec<DocumentChunk> {
    let indexed_at = Utc::now();

    splitter
        .split_text(&transcript.full_text())
        .into_iter()
        .enumerate()
        .map(|(order, content)| {
            DocumentChunk::new(
                content,
                ChunkMetadata {
                    source: transcript.video_id.clone(),
                    title: transcript.title.clone(),
                    chunk_order: order as i32,
                    indexed_at,
                },
            )
        })
        .collect()
}
