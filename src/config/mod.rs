//! Configuration module for Smak.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, RecipePrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings, OllamaSettings,
    PromptSettings, Settings, TranscriptSettings, VectorStoreSettings,
};
