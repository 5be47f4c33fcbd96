//! In-memory vector store implementation.
//!
//! Useful for testing and offline runs.

use super::{cosine_similarity, QueryResult, VectorStore};
use crate::chunking::DocumentChunk;
use crate::error::{Result, SmakError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// One stored chunk with its embedding.
#[derive(Debug, Clone)]
struct StoredChunk {
    content: String,
    metadata: serde_json::Map<String, serde_json::Value>,
    embedding: Vec<f32>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<StoredChunk>>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().unwrap();
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_count(&self, name: &str) -> Result<Option<usize>> {
        let collections = self.collections.read().unwrap();
        Ok(collections.get(name).map(|chunks| chunks.len()))
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

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

        let mut collections = self.collections.write().unwrap();
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| SmakError::VectorStore(format!("Collection '{}' does not exist", collection)))?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            stored.push(StoredChunk {
                content: chunk.content.clone(),
                metadata: chunk.metadata.to_json_map(),
                embedding: embedding.clone(),
            });
        }

        Ok(chunks.len())
    }

    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryResult>> {
        let collections = self.collections.read().unwrap();
        let stored = collections
            .get(collection)
            .ok_or_else(|| SmakError::VectorStore(format!("Collection '{}' does not exist", collection)))?;

        let mut results: Vec<QueryResult> = stored
            .iter()
            .map(|chunk| QueryResult {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                score: Some(cosine_similarity(query_embedding, &chunk.embedding)),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn sample(&self, collection: &str, limit: usize) -> Result<Vec<QueryResult>> {
        let collections = self.collections.read().unwrap();
        let stored = collections
            .get(collection)
            .ok_or_else(|| SmakError::VectorStore(format!("Collection '{}' does not exist", collection)))?;

        Ok(stored
            .iter()
            .take(limit)
            .map(|chunk| QueryResult {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                score: None,
            })
            .collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        collections.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkMetadata;
    use chrono::Utc;

    fn chunk(content: &str, order: i32) -> DocumentChunk {
        DocumentChunk::new(
            content.to_string(),
            ChunkMetadata {
                source: "video1".to_string(),
                title: "Test Video".to_string(),
                chunk_order: order,
                indexed_at: Utc::now(),
            },
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store.create_collection("youtube_video1").await.unwrap();
        store
            .add_chunks(
                "youtube_video1",
                &[chunk("Hello world", 0), chunk("Goodbye world", 1)],
                &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            )
            .await
            .unwrap();

        assert_eq!(
            store.collection_count("youtube_video1").await.unwrap(),
            Some(2)
        );
        assert_eq!(store.collection_count("missing").await.unwrap(), None);

        let results = store
            .query("youtube_video1", &[1.0, 0.0, 0.0], 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "Hello world");
        assert!(results[0].score.unwrap() > results[1].score.unwrap());

        let names = store.list_collections().await.unwrap();
        assert_eq!(names, vec!["youtube_video1".to_string()]);
    }

    #[tokio::test]
    async fn test_query_respects_limit() {
        let store = MemoryVectorStore::new();
        store.create_collection("c").await.unwrap();

        let chunks: Vec<DocumentChunk> =
            (0..10).map(|i| chunk(&format!("chunk {}", i), i)).collect();
        let embeddings: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32, 1.0]).collect();
        store.add_chunks("c", &chunks, &embeddings).await.unwrap();

        let results = store.query("c", &[1.0, 1.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(!result.content.is_empty());
        }
    }

    #[tokio::test]
    async fn test_sample_without_query() {
        let store = MemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        store
            .add_chunks(
                "c",
                &[chunk("a", 0), chunk("b", 1), chunk("c", 2)],
                &[vec![1.0], vec![2.0], vec![3.0]],
            )
            .await
            .unwrap();

        let sampled = store.sample("c", 2).await.unwrap();
        assert_eq!(sampled.len(), 2);
        assert!(sampled.iter().all(|r| r.score.is_none()));
    }

    #[tokio::test]
    async fn test_query_missing_collection_fails() {
        let store = MemoryVectorStore::new();
        assert!(store.query("missing", &[1.0], 5).await.is_err());
        assert!(store.sample("missing", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_collection() {
        let store = MemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        store.delete_collection("c").await.unwrap();
        assert_eq!(store.collection_count("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_mismatched_embeddings_fails() {
        let store = MemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        let result = store.add_chunks("c", &[chunk("a", 0)], &[]).await;
        assert!(result.is_err());
    }
}
