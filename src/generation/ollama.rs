//! Ollama chat generation implementation.
//!
//! Calls the `/api/chat` endpoint with `stream: true` and yields the content
//! of each NDJSON line as a fragment.

use super::{Generator, TokenStream};
use crate::error::{Result, SmakError};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Timeout for a full generation, stream included.
const GEN_TIMEOUT_SECS: u64 = 600;

/// Ollama-based generator.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a new Ollama generator with default settings.
    pub fn new() -> Self {
        Self::with_config("http://localhost:11434", "phi4")
    }

    /// Create a new Ollama generator with custom endpoint and model.
    pub fn with_config(base_url: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

impl Default for OllamaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Default)]
struct ChatMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// One NDJSON line of a streamed chat response.
#[derive(Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    message: ChatMessage,
    #[serde(default)]
    done: bool,
}

/// Parse one NDJSON line into an optional content fragment.
fn parse_stream_line(line: &str) -> Result<Option<String>> {
    let chunk: ChatStreamChunk = serde_json::from_str(line)
        .map_err(|e| SmakError::Generation(format!("Failed to parse stream line: {}", e)))?;

    if chunk.message.content.is_empty() {
        // Terminal lines carry stats but no content.
        let _ = chunk.done;
        Ok(None)
    } else {
        Ok(Some(chunk.message.content))
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn generate(&self, system: &str, prompt: &str) -> Result<TokenStream> {
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| SmakError::Generation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SmakError::Generation(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        debug!("Streaming chat response");

        // Re-frame the byte stream into NDJSON lines; partial lines are
        // buffered across network chunks.
        let stream = response
            .bytes_stream()
            .map_err(|e| SmakError::Generation(format!("Stream error: {}", e)))
            .scan(String::new(), |buffer, chunk| {
                let fragments: Vec<Result<String>> = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        let mut out = Vec::new();
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim().to_string();
                            buffer.drain(..=pos);
                            if line.is_empty() {
                                continue;
                            }
                            match parse_stream_line(&line) {
                                Ok(Some(content)) => out.push(Ok(content)),
                                Ok(None) => {}
                                Err(e) => out.push(Err(e)),
                            }
                        }
                        out
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(futures::stream::iter(fragments)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}
