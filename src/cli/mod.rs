//! CLI module for Smak.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Smak - Recipe Extraction via RAG
///
/// Ask questions about cooking videos, answered from their transcripts.
/// The name "Smak" comes from the Norwegian/Scandinavian word for "taste."
#[derive(Parser, Debug)]
#[command(name = "smak")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Answer a prompt about one video from the terminal
    Extract {
        /// YouTube URL or video id
        link: String,

        /// The prompt to answer (defaults to the built-in recipe extraction prompt)
        #[arg(short = 'q', long)]
        prompt: Option<String>,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List vector store collections, or inspect one
    Collections {
        /// Collection name to inspect (lists all collections when omitted)
        name: Option<String>,

        /// Similarity search query (returns a sample when omitted)
        #[arg(short = 'q', long)]
        query: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
