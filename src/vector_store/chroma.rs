//! Chroma-backed vector store.
//!
//! Speaks the Chroma v1 REST API. Collections are created with cosine space
//! so reported distances convert directly to similarity scores.

use super::{QueryResult, VectorStore};
use crate::chunking::DocumentChunk;
use crate::error::{Result, SmakError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Default Chroma endpoint.
pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";

/// Timeout for store requests.
const STORE_TIMEOUT_SECS: u64 = 60;

/// Chroma REST vector store.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: String,
}

impl ChromaVectorStore {
    /// Create a store client against the default local endpoint.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CHROMA_URL)
    }

    /// Create a store client against a custom endpoint.
    pub fn with_config(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(STORE_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Resolve a collection by name. A non-success response means the
    /// collection does not exist (Chroma reports unknown names as errors).
    async fn get_collection(&self, name: &str) -> Result<Option<ChromaCollection>> {
        let response = self
            .client
            .get(self.api(&format!("collections/{}", name)))
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let collection: ChromaCollection = response
            .json()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Failed to parse response: {}", e)))?;

        Ok(Some(collection))
    }

    /// Resolve a collection or fail with a store error.
    async fn require_collection(&self, name: &str) -> Result<ChromaCollection> {
        self.get_collection(name).await?.ok_or_else(|| {
            SmakError::VectorStore(format!("Collection '{}' does not exist", name))
        })
    }

    async fn check(&self, response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SmakError::VectorStore(format!(
                "{} failed, store returned {}: {}",
                action, status, body
            )))
        }
    }
}

impl Default for ChromaVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.api("collections"))
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        let response = self.check(response, "Listing collections").await?;

        let collections: Vec<ChromaCollection> = response
            .json()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Failed to parse response: {}", e)))?;

        Ok(collections
            .into_iter()
            .map(|c| c.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    #[instrument(skip(self))]
    async fn collection_count(&self, name: &str) -> Result<Option<usize>> {
        let collection = match self.get_collection(name).await? {
            Some(c) => c,
            None => return Ok(None),
        };

        let response = self
            .client
            .get(self.api(&format!("collections/{}/count", collection.id)))
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        let response = self.check(response, "Counting collection").await?;

        let count: usize = response
            .json()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Failed to parse count: {}", e)))?;

        Ok(Some(count))
    }

    #[instrument(skip(self))]
    async fn create_collection(&self, name: &str) -> Result<()> {
        let request = CreateCollectionRequest {
            name: name.to_string(),
            get_or_create: true,
            metadata: serde_json::json!({ "hnsw:space": "cosine" }),
        };

        let response = self
            .client
            .post(self.api("collections"))
            .json(&request)
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        self.check(response, "Creating collection").await?;

        debug!("Created collection {}", name);
        Ok(())
    }

    #[instrument(skip(self, chunks, embeddings), fields(count = chunks.len()))]
    async fn add_chunks(
        &self,
        collection: &str,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(SmakError::VectorStore(format!(
                "Chunk/embedding count mismatch: {} vs {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let target = self.require_collection(collection).await?;

        let request = AddRequest {
            ids: chunks.iter().map(|_| Uuid::new_v4().to_string()).collect(),
            embeddings: embeddings.to_vec(),
            documents: chunks.iter().map(|c| c.content.clone()).collect(),
            metadatas: chunks.iter().map(|c| c.metadata.to_json_map()).collect(),
        };

        let response = self
            .client
            .post(self.api(&format!("collections/{}/add", target.id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        self.check(response, "Adding chunks").await?;

        debug!("Added {} chunks to {}", chunks.len(), collection);
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryResult>> {
        let target = self.require_collection(collection).await?;

        let request = QueryRequest {
            query_embeddings: vec![query_embedding.to_vec()],
            n_results: limit,
            include: vec!["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(self.api(&format!("collections/{}/query", target.id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        let response = self.check(response, "Querying collection").await?;

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Failed to parse response: {}", e)))?;

        // Results arrive column-wise, one row per query embedding.
        let documents = result.documents.into_iter().next().unwrap_or_default();
        let metadatas = result.metadatas.into_iter().next().unwrap_or_default();
        let distances = result.distances.into_iter().next().unwrap_or_default();

        let mut results = Vec::with_capacity(documents.len());
        for (i, document) in documents.into_iter().enumerate() {
            let content = match document {
                Some(text) => text,
                None => {
                    warn!("Store returned a result without document text, dropping it");
                    continue;
                }
            };
            results.push(QueryResult {
                content,
                metadata: metadatas.get(i).cloned().flatten().unwrap_or_default(),
                // Cosine distance, so similarity is its complement.
                score: distances.get(i).map(|d| 1.0 - d),
            });
        }

        Ok(results)
    }

    #[instrument(skip(self))]
    async fn sample(&self, collection: &str, limit: usize) -> Result<Vec<QueryResult>> {
        let target = self.require_collection(collection).await?;

        let request = GetRequest {
            limit,
            include: vec!["documents", "metadatas"],
        };

        let response = self
            .client
            .post(self.api(&format!("collections/{}/get", target.id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        let response = self.check(response, "Sampling collection").await?;

        let result: GetResponse = response
            .json()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Failed to parse response: {}", e)))?;

        let results = result
            .documents
            .into_iter()
            .enumerate()
            .filter_map(|(i, document)| {
                document.map(|content| QueryResult {
                    content,
                    metadata: result.metadatas.get(i).cloned().flatten().unwrap_or_default(),
                    score: None,
                })
            })
            .collect();

        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.api(&format!("collections/{}", name)))
            .send()
            .await
            .map_err(|e| SmakError::VectorStore(format!("Request failed: {}", e)))?;
        self.check(response, "Deleting collection").await?;

        debug!("Deleted collection {}", name);
        Ok(())
    }
}

/// Collection descriptor as returned by Chroma.
#[derive(Debug, Clone, Deserialize)]
struct ChromaCollection {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    name: String,
    get_or_create: bool,
    metadata: serde_json::Value,
}

#[derive(Serialize)]
struct AddRequest {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<String>,
    metadatas: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<serde_json::Map<String, serde_json::Value>>>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GetRequest {
    limit: usize,
    include: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(default)]
    documents: Vec<Option<String>>,
    #[serde(default)]
    metadatas: Vec<Option<serde_json::Map<String, serde_json::Value>>>,
}
