//! Smak - Recipe Extraction via RAG
//!
//! Turn cooking videos into answers: paste a YouTube link, ask a question,
//! get a response grounded in the video's transcript.
//!
//! The name "Smak" comes from the Norwegian/Scandinavian word for "taste."
//!
//! # Overview
//!
//! Smak allows you to:
//! - Pull the caption transcript of a YouTube video
//! - Index it as overlapping chunks in a vector store
//! - Ask questions answered only from the retrieved transcript context
//! - Browse and query the collections that have been built so far
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `video` - Video reference parsing and collection naming
//! - `transcript` - Caption transcript loading
//! - `chunking` - Overlapping-window text splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `generation` - Streamed text generation
//! - `rag` - Retrieval + generation over one collection
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use smak::config::Settings;
//! use smak::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let answer = orchestrator
//!         .answer("https://youtu.be/dQw4w9WgXcQ", "List the ingredients")
//!         .await?;
//!     println!("{}", answer.response);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod orchestrator;
pub mod rag;
pub mod transcript;
pub mod vector_store;
pub mod video;

pub use error::{Result, SmakError};
