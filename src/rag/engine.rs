//! RAG answer generation.

use super::format_context_for_prompt;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::{collect_answer, Generator};
use crate::vector_store::VectorStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// RAG engine for answering questions from one collection.
pub struct RagEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    max_context_chunks: usize,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        max_context_chunks: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            prompts: Prompts::default(),
            max_context_chunks,
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a question using only chunks retrieved from `collection`.
    ///
    /// The generator's fragment stream is drained and concatenated in
    /// arrival order.
    #[instrument(skip(self, question), fields(collection = %collection))]
    pub async fn answer_from(&self, collection: &str, question: &str) -> Result<String> {
        info!("Answering from collection {}", collection);

        let query_embedding = self.embedder.embed(question).await?;
        let context_chunks = self
            .store
            .query(collection, &query_embedding, self.max_context_chunks)
            .await?;

        debug!("Retrieved {} context chunks", context_chunks.len());

        let context_text = format_context_for_prompt(&context_chunks);

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context_text);
        vars.insert("question".to_string(), question.to_string());

        let system = Prompts::render(&self.prompts.rag.system, &vars);
        let user = Prompts::render(&self.prompts.rag.user, &vars);

        let stream = self.generator.generate(&system, &user).await?;
        collect_answer(stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{ChunkMetadata, DocumentChunk};
    use crate::error::SmakError;
    use crate::generation::TokenStream;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use futures::stream;
    use std::sync::Mutex;

    /// Embedder that returns a fixed vector and records its inputs.
    struct FixedEmbedder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            self.calls.lock().unwrap().push(text.to_string());
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Generator that echoes its system prompt back in two fragments.
    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, system: &str, _prompt: &str) -> crate::error::Result<TokenStream> {
            let halfway = system.len() / 2;
            let fragments = vec![
                Ok(system[..halfway].to_string()),
                Ok(system[halfway..].to_string()),
            ];
            Ok(Box::pin(stream::iter(fragments)))
        }
    }

    fn chunk(content: &str, order: i32) -> DocumentChunk {
        DocumentChunk::new(
            content.to_string(),
            ChunkMetadata {
                source: "vid".to_string(),
                title: "Stew Basics".to_string(),
                chunk_order: order,
                indexed_at: Utc::now(),
            },
        )
    }

    #[tokio::test]
    async fn test_answer_includes_retrieved_context() {
        let store = Arc::new(MemoryVectorStore::new());
        store.create_collection("youtube_vid").await.unwrap();
        store
            .add_chunks(
                "youtube_vid",
                &[chunk("sear the beef in batches", 0)],
                &[vec![1.0, 0.0]],
            )
            .await
            .unwrap();

        let embedder = Arc::new(FixedEmbedder {
            calls: Mutex::new(Vec::new()),
        });
        let engine = RagEngine::new(store, embedder.clone(), Arc::new(EchoGenerator), 5);

        let answer = engine
            .answer_from("youtube_vid", "how do I brown the meat?")
            .await
            .unwrap();

        // The echoed system prompt carries the retrieved chunk.
        assert!(answer.contains("sear the beef in batches"));
        assert!(answer.contains("Stew Basics"));
        // The question itself was embedded for retrieval.
        assert_eq!(
            embedder.calls.lock().unwrap().as_slice(),
            &["how do I brown the meat?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_answer_from_missing_collection_fails() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(FixedEmbedder {
            calls: Mutex::new(Vec::new()),
        });
        let engine = RagEngine::new(store, embedder, Arc::new(EchoGenerator), 5);

        let result = engine.answer_from("youtube_missing", "anything").await;
        assert!(matches!(result, Err(SmakError::VectorStore(_))));
    }
}
