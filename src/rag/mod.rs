//! Retrieval-augmented generation over one collection.
//!
//! Retrieves the most relevant transcript chunks for a question and feeds
//! them to the generator as the only allowed sources.

mod engine;

pub use engine::RagEngine;

use crate::vector_store::QueryResult;

/// Format retrieved chunks for inclusion in the system prompt.
pub fn format_context_for_prompt(results: &[QueryResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let title = result
                .metadata
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Untitled");
            format!("---\n[{}] {}\n{}\n---", i + 1, title, result.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
