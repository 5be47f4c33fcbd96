//! Collections command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{CollectionResults, Orchestrator};
use anyhow::Result;

/// Run the collections command.
pub async fn run_collections(
    name: Option<String>,
    query: Option<String>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let Some(name) = name else {
        return list_all(&orchestrator).await;
    };

    match orchestrator
        .inspect_collection(&name, query.as_deref(), limit)
        .await
    {
        Ok(report) => {
            Output::header(&report.name);
            Output::kv("Documents", &report.document_count.to_string());

            let (label, results) = match report.results {
                CollectionResults::Search(results) => ("Search results", results),
                CollectionResults::Sample(results) => ("Sample", results),
            };

            if results.is_empty() {
                Output::info("No stored items to show.");
            } else {
                Output::header(label);
                for (i, result) in results.iter().enumerate() {
                    Output::chunk_result(i + 1, &result.content, result.score);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to inspect collection: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

async fn list_all(orchestrator: &Orchestrator) -> Result<()> {
    match orchestrator.list_collections().await {
        Ok(collections) => {
            if collections.is_empty() {
                Output::info("No collections yet. Use 'smak extract <link>' to build one.");
            } else {
                Output::header(&format!("Collections ({})", collections.len()));
                println!();
                for name in &collections {
                    Output::list_item(name);
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to list collections: {}", e));
            Err(e.into())
        }
    }
}
