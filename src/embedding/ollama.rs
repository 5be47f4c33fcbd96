//! Ollama embeddings implementation.

use super::Embedder;
use crate::error::{Result, SmakError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Timeout for embedding requests.
const EMBED_TIMEOUT_SECS: u64 = 120;

/// Ollama has no hard batch limit, but oversized requests stall; keep
/// requests bounded.
const BATCH_SIZE: usize = 64;

/// Ollama-based embedder.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder with default settings.
    pub fn new() -> Self {
        Self::with_config("http://localhost:11434", "nomic-embed-text", 768)
    }

    /// Create a new Ollama embedder with custom endpoint, model and dimensions.
    pub fn with_config(base_url: &str, model: &str, dimensions: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        }
    }
}

impl Default for OllamaEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SmakError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let request = EmbeddingRequest {
                model: self.model.clone(),
                input: batch.to_vec(),
            };

            let response = self
                .client
                .post(format!("{}/api/embed", self.base_url))
                .json(&request)
                .send()
                .await
                .map_err(|e| SmakError::Embedding(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(SmakError::Embedding(format!(
                    "Ollama returned {}: {}",
                    status, body
                )));
            }

            let result: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| SmakError::Embedding(format!("Failed to parse response: {}", e)))?;

            if result.embeddings.len() != batch.len() {
                return Err(SmakError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    result.embeddings.len()
                )));
            }

            all_embeddings.extend(result.embeddings);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
