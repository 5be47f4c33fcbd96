//! Vector store abstraction.
//!
//! Provides a trait-based, collection-oriented interface for vector database
//! backends. Collections partition chunks by source video.

mod chroma;
mod memory;

pub use chroma::ChromaVectorStore;
pub use memory::MemoryVectorStore;

use crate::chunking::DocumentChunk;
use crate::error::Result;
use async_trait::async_trait;

/// A stored item returned by similarity search or sampling.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Text content of the stored chunk.
    pub content: String,
    /// Metadata map stored alongside the chunk.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Similarity score (higher is better); absent for samples.
    pub score: Option<f32>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// List the names of all collections known to the store.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Item count of a collection, or `None` when it does not exist.
    async fn collection_count(&self, name: &str) -> Result<Option<usize>>;

    /// Create a collection (get-or-create semantics).
    async fn create_collection(&self, name: &str) -> Result<()>;

    /// Add chunks with their embeddings to a collection.
    async fn add_chunks(
        &self,
        collection: &str,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize>;

    /// Similarity search within a collection.
    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryResult>>;

    /// An arbitrary sample of up to `limit` items from a collection.
    async fn sample(&self, collection: &str, limit: usize) -> Result<Vec<QueryResult>>;

    /// Delete a collection and everything in it.
    async fn delete_collection(&self, name: &str) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
