//! Extract command implementation.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the extract command.
pub async fn run_extract(
    link: &str,
    prompt: Option<String>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.generation.model = model;
    }

    // With no prompt of their own, callers get the built-in recipe
    // extraction prompt.
    let prompt = match prompt {
        Some(p) => p,
        None => {
            let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
            prompts.recipe.extraction
        }
    };

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and generating answer...");

    match orchestrator.answer(link, &prompt).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.response);

            Output::header("Details");
            Output::kv("Video", &answer.video_id);
            Output::kv("Collection", &answer.collection);
            if answer.cache_hit {
                Output::kv("Transcript", "reused existing collection");
            } else {
                Output::kv("Transcript", &format!("indexed {} chunks", answer.chunks_indexed));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
