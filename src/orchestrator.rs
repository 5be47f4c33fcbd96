//! Pipeline orchestrator for Smak.
//!
//! Coordinates the whole path from video link to generated answer: cache
//! check, transcript ingestion, retrieval and generation.

use crate::chunking::{chunk_transcript, RecursiveSplitter, SplitterConfig};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OllamaEmbedder};
use crate::error::{Result, SmakError};
use crate::generation::{Generator, OllamaGenerator};
use crate::rag::RagEngine;
use crate::transcript::{TranscriptLoader, YoutubeTranscriptLoader};
use crate::vector_store::{ChromaVectorStore, QueryResult, VectorStore};
use crate::video::VideoReference;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

/// The main orchestrator for the Smak pipeline.
pub struct Orchestrator {
    settings: Settings,
    loader: Arc<dyn TranscriptLoader>,
    splitter: RecursiveSplitter,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    engine: RagEngine,
    // One async mutex per video id so concurrent first-time requests for the
    // same video ingest at most once. Entries are tiny and bounded by the
    // number of distinct videos seen by this process.
    ingest_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    /// Create a new orchestrator with default components from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let loader: Arc<dyn TranscriptLoader> = Arc::new(YoutubeTranscriptLoader::with_languages(
            settings.transcript.languages.clone(),
        ));

        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::with_config(
            &settings.ollama.url,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::with_config(
            &settings.ollama.url,
            &settings.generation.model,
        ));

        let store: Arc<dyn VectorStore> =
            Arc::new(ChromaVectorStore::with_config(&settings.vector_store.url));

        Self::with_components(settings, prompts, loader, embedder, store, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        loader: Arc<dyn TranscriptLoader>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let splitter = RecursiveSplitter::new(SplitterConfig {
            chunk_size: settings.chunking.chunk_size,
            chunk_overlap: settings.chunking.chunk_overlap,
        });

        let engine = RagEngine::new(
            store.clone(),
            embedder.clone(),
            generator,
            settings.generation.max_context_chunks,
        )
        .with_prompts(prompts);

        Ok(Self {
            settings,
            loader,
            splitter,
            embedder,
            store,
            engine,
            ingest_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get a reference to the vector store.
    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Answer a prompt about a video, ingesting its transcript first if
    /// this is the first time the video is seen.
    #[instrument(skip(self, prompt), fields(video_reference = %video_reference))]
    pub async fn answer(&self, video_reference: &str, prompt: &str) -> Result<GeneratedAnswer> {
        if video_reference.trim().is_empty() || prompt.trim().is_empty() {
            return Err(SmakError::InvalidInput(
                "Both the video link and the prompt are required".to_string(),
            ));
        }

        let reference = VideoReference::parse(video_reference).ok_or_else(|| {
            SmakError::InvalidInput(format!("Not a recognizable YouTube link: {}", video_reference))
        })?;
        let collection = reference.collection_name();

        // Serialize the check-then-ingest window per video id; the guard is
        // released before retrieval so readers never wait on each other.
        let (cache_hit, chunks_indexed) = {
            let lock = self.ingest_lock(reference.video_id());
            let _guard = lock.lock().await;

            match self.store.collection_count(&collection).await {
                Ok(Some(count)) if count > 0 => {
                    info!("Collection {} already has {} chunks, skipping ingestion", collection, count);
                    (true, 0)
                }
                Ok(_) => (false, self.ingest(&reference, &collection).await?),
                Err(e) => {
                    warn!("Existence check for {} failed ({}), treating as cache miss", collection, e);
                    (false, self.ingest(&reference, &collection).await?)
                }
            }
        };

        let response = self.engine.answer_from(&collection, prompt).await?;

        Ok(GeneratedAnswer {
            response,
            video_id: reference.video_id().to_string(),
            collection,
            cache_hit,
            chunks_indexed,
        })
    }

    /// Load, chunk, embed and store one video's transcript.
    async fn ingest(&self, reference: &VideoReference, collection: &str) -> Result<usize> {
        info!("Ingesting transcript for {}", reference.video_id());

        let transcript = self.loader.load(reference.video_id()).await?;
        if transcript.segments.is_empty() {
            return Err(SmakError::ContentUnavailable(format!(
                "Video {} has no transcript",
                reference.video_id()
            )));
        }

        let chunks = chunk_transcript(&transcript, &self.splitter);
        if chunks.is_empty() {
            return Err(SmakError::ContentUnavailable(format!(
                "Video {} has an empty transcript",
                reference.video_id()
            )));
        }
        info!("Split transcript into {} chunks", chunks.len());

        // Embed before touching the store so an embedding failure leaves no
        // trace behind.
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        self.store.create_collection(collection).await?;
        match self.store.add_chunks(collection, &chunks, &embeddings).await {
            Ok(count) => {
                info!("Indexed {} chunks into {}", count, collection);
                Ok(count)
            }
            Err(e) => {
                // A half-written collection would read as a cache hit later.
                if let Err(cleanup) = self.store.delete_collection(collection).await {
                    warn!("Failed to clean up partial collection {}: {}", collection, cleanup);
                }
                Err(e)
            }
        }
    }

    fn ingest_lock(&self, video_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.ingest_locks.lock().unwrap();
        locks
            .entry(video_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// List all collections known to the vector store.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.store.list_collections().await
    }

    /// Inspect one collection: count plus either a similarity search (when a
    /// query is given) or an arbitrary sample.
    #[instrument(skip(self, query))]
    pub async fn inspect_collection(
        &self,
        name: &str,
        query: Option<&str>,
        limit: usize,
    ) -> Result<CollectionReport> {
        if name.trim().is_empty() {
            return Err(SmakError::InvalidInput(
                "Collection name is required".to_string(),
            ));
        }

        let document_count = self.store.collection_count(name).await?.ok_or_else(|| {
            SmakError::VectorStore(format!("Collection '{}' does not exist", name))
        })?;

        let results = match query {
            Some(q) if !q.trim().is_empty() => {
                let query_embedding = self.embedder.embed(q).await?;
                CollectionResults::Search(self.store.query(name, &query_embedding, limit).await?)
            }
            _ => CollectionResults::Sample(self.store.sample(name, limit).await?),
        };

        Ok(CollectionReport {
            name: name.to_string(),
            document_count,
            results,
        })
    }
}

/// The answer to one request, with ingestion bookkeeping.
#[derive(Debug)]
pub struct GeneratedAnswer {
    /// Concatenated generation output.
    pub response: String,
    /// Canonical video id.
    pub video_id: String,
    /// Collection the answer was drawn from.
    pub collection: String,
    /// Whether ingestion was skipped because the collection already existed.
    pub cache_hit: bool,
    /// Number of chunks indexed by this request (0 on cache hit).
    pub chunks_indexed: usize,
}

/// Inspection result for one collection.
#[derive(Debug)]
pub struct CollectionReport {
    /// Collection name.
    pub name: String,
    /// Total stored items.
    pub document_count: usize,
    /// Search results or an arbitrary sample.
    pub results: CollectionResults,
}

/// Results of a collection inspection.
#[derive(Debug)]
pub enum CollectionResults {
    /// Similarity search results for a query.
    Search(Vec<QueryResult>),
    /// Arbitrary sample of stored items.
    Sample(Vec<QueryResult>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::DocumentChunk;
    use crate::generation::TokenStream;
    use crate::transcript::{TranscriptSegment, VideoTranscript};
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VIDEO_ID: &str = "dQw4w9WgXcQ";
    const LINK: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    /// Loader that serves a canned transcript and counts invocations.
    struct FakeLoader {
        segments: Vec<TranscriptSegment>,
        calls: AtomicUsize,
    }

    impl FakeLoader {
        fn with_text(lines: &[&str]) -> Self {
            Self {
                segments: lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| {
                        TranscriptSegment::new(line.to_string(), i as f64 * 5.0, 5.0)
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self {
                segments: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranscriptLoader for FakeLoader {
        async fn load(&self, video_id: &str) -> Result<VideoTranscript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VideoTranscript::new(
                video_id.to_string(),
                "Grandma's Meatballs".to_string(),
                self.segments.clone(),
            ))
        }
    }

    /// Deterministic embedder.
    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Generator that yields a fixed fragment sequence.
    struct FakeGenerator;

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<TokenStream> {
            let fragments = vec![Ok("Brown the ".to_string()), Ok("meatballs.".to_string())];
            Ok(Box::pin(stream::iter(fragments)))
        }
    }

    /// Store wrapper that fails every add, for cleanup testing.
    struct FailingAddStore {
        inner: MemoryVectorStore,
    }

    #[async_trait]
    impl VectorStore for FailingAddStore {
        async fn list_collections(&self) -> Result<Vec<String>> {
            self.inner.list_collections().await
        }

        async fn collection_count(&self, name: &str) -> Result<Option<usize>> {
            self.inner.collection_count(name).await
        }

        async fn create_collection(&self, name: &str) -> Result<()> {
            self.inner.create_collection(name).await
        }

        async fn add_chunks(
            &self,
            _collection: &str,
            _chunks: &[DocumentChunk],
            _embeddings: &[Vec<f32>],
        ) -> Result<usize> {
            Err(SmakError::VectorStore("write refused".to_string()))
        }

        async fn query(
            &self,
            collection: &str,
            query_embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<QueryResult>> {
            self.inner.query(collection, query_embedding, limit).await
        }

        async fn sample(&self, collection: &str, limit: usize) -> Result<Vec<QueryResult>> {
            self.inner.sample(collection, limit).await
        }

        async fn delete_collection(&self, name: &str) -> Result<()> {
            self.inner.delete_collection(name).await
        }
    }

    fn orchestrator_with(
        loader: Arc<FakeLoader>,
        store: Arc<dyn VectorStore>,
    ) -> Orchestrator {
        Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            loader,
            Arc::new(FakeEmbedder),
            store,
            Arc::new(FakeGenerator),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_inputs_are_rejected() {
        let loader = Arc::new(FakeLoader::with_text(&["some captions"]));
        let orchestrator = orchestrator_with(loader.clone(), Arc::new(MemoryVectorStore::new()));

        let err = orchestrator.answer("", "how long to bake?").await.unwrap_err();
        assert!(matches!(err, SmakError::InvalidInput(_)));

        let err = orchestrator.answer(LINK, "").await.unwrap_err();
        assert!(matches!(err, SmakError::InvalidInput(_)));

        // Validation failures never reach the loader.
        assert_eq!(loader.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_link_is_rejected() {
        let loader = Arc::new(FakeLoader::with_text(&["some captions"]));
        let orchestrator = orchestrator_with(loader.clone(), Arc::new(MemoryVectorStore::new()));

        let err = orchestrator
            .answer("https://example.com/watch?v=nope", "what is the sauce?")
            .await
            .unwrap_err();
        assert!(matches!(err, SmakError::InvalidInput(_)));
        assert_eq!(loader.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_request_ingests_then_answers() {
        let loader = Arc::new(FakeLoader::with_text(&[
            "start by soaking the bread in milk",
            "mix beef and pork with the soaked bread",
            "roll into balls and brown them in butter",
        ]));
        let store = Arc::new(MemoryVectorStore::new());
        let orchestrator = orchestrator_with(loader.clone(), store.clone());

        let answer = orchestrator.answer(LINK, "how are they cooked?").await.unwrap();

        assert_eq!(answer.response, "Brown the meatballs.");
        assert_eq!(answer.video_id, VIDEO_ID);
        assert_eq!(answer.collection, "youtube_dQw4w9WgXcQ");
        assert!(!answer.cache_hit);
        assert!(answer.chunks_indexed > 0);
        assert_eq!(loader.call_count(), 1);

        let count = store
            .collection_count("youtube_dQw4w9WgXcQ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, answer.chunks_indexed);
    }

    #[tokio::test]
    async fn test_repeat_request_reuses_collection() {
        let loader = Arc::new(FakeLoader::with_text(&[
            "preheat the oven to 200 degrees",
            "season generously with smoked paprika",
        ]));
        let store = Arc::new(MemoryVectorStore::new());
        let orchestrator = orchestrator_with(loader.clone(), store.clone());

        let first = orchestrator.answer(LINK, "what temperature?").await.unwrap();
        let count_after_first = store
            .collection_count(&first.collection)
            .await
            .unwrap()
            .unwrap();

        // Different prompt, same video: ingestion must not run again.
        let second = orchestrator.answer(LINK, "which spices?").await.unwrap();
        let count_after_second = store
            .collection_count(&second.collection)
            .await
            .unwrap()
            .unwrap();

        assert!(second.cache_hit);
        assert_eq!(second.chunks_indexed, 0);
        assert_eq!(loader.call_count(), 1);
        assert_eq!(count_after_first, count_after_second);
        // Retrieval and generation still ran.
        assert_eq!(second.response, "Brown the meatballs.");
    }

    #[tokio::test]
    async fn test_empty_transcript_is_content_unavailable() {
        let loader = Arc::new(FakeLoader::empty());
        let store = Arc::new(MemoryVectorStore::new());
        let orchestrator = orchestrator_with(loader, store.clone());

        let err = orchestrator.answer(LINK, "any tips?").await.unwrap_err();
        assert!(matches!(err, SmakError::ContentUnavailable(_)));

        // Nothing half-written left behind.
        assert_eq!(
            store.collection_count("youtube_dQw4w9WgXcQ").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_failed_ingestion_leaves_no_partial_collection() {
        let loader = Arc::new(FakeLoader::with_text(&["some captions worth indexing"]));
        let store = Arc::new(FailingAddStore {
            inner: MemoryVectorStore::new(),
        });
        let orchestrator = orchestrator_with(loader, store.clone());

        let err = orchestrator.answer(LINK, "does it fail?").await.unwrap_err();
        assert!(matches!(err, SmakError::VectorStore(_)));

        // The compensating delete removed the empty collection, so the next
        // request sees a clean cache miss instead of an empty cache hit.
        assert_eq!(
            store.collection_count("youtube_dQw4w9WgXcQ").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_inspect_collection_search_and_sample() {
        let loader = Arc::new(FakeLoader::with_text(&[
            "a pinch of salt goes a long way",
            "finish with lemon zest",
            "rest the dough for an hour",
            "knead until smooth",
        ]));
        let store = Arc::new(MemoryVectorStore::new());
        let orchestrator = orchestrator_with(loader, store);

        orchestrator.answer(LINK, "prime the cache").await.unwrap();

        let report = orchestrator
            .inspect_collection("youtube_dQw4w9WgXcQ", Some("salt"), 3)
            .await
            .unwrap();
        assert!(report.document_count > 0);
        match report.results {
            CollectionResults::Search(results) => {
                assert!(results.len() <= 3);
                assert!(!results.is_empty());
                assert!(results.iter().all(|r| !r.content.is_empty()));
            }
            CollectionResults::Sample(_) => panic!("expected search results"),
        }

        let report = orchestrator
            .inspect_collection("youtube_dQw4w9WgXcQ", None, 2)
            .await
            .unwrap();
        match report.results {
            CollectionResults::Sample(results) => assert!(results.len() <= 2),
            CollectionResults::Search(_) => panic!("expected a sample"),
        }
    }

    #[tokio::test]
    async fn test_inspect_requires_collection_name() {
        let loader = Arc::new(FakeLoader::with_text(&["x"]));
        let orchestrator = orchestrator_with(loader, Arc::new(MemoryVectorStore::new()));

        let err = orchestrator.inspect_collection("", None, 5).await.unwrap_err();
        assert!(matches!(err, SmakError::InvalidInput(_)));
    }
}
