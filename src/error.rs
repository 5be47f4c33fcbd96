//! Error types for Smak.

use thiserror::Error;

/// Library-level error type for Smak operations.
#[derive(Error, Debug)]
pub enum SmakError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No usable captions for this video: {0}")]
    ContentUnavailable(String),

    #[error("Transcript fetch failed: {0}")]
    Transcript(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Smak operations.
pub type Result<T> = std::result::Result<T, SmakError>;
