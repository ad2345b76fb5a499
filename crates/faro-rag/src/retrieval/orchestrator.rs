//! Query orchestration: embed, search, compare, assemble, generate
//!
//! The orchestrator owns the failure policy of the pipeline. Embedding, the
//! primary search, and generation are required; the shadow search runs on a
//! detached, time-boxed task whose outcome is joined opportunistically on a
//! side channel and can never delay or fail the response.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::metrics::SearchMetrics;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorSearchProvider};
use crate::types::query::QueryRequest;
use crate::types::response::{QueryResponse, StageTimings, NO_EXTRACTED_TEXT_ANSWER};
use crate::Result;

use super::context::ContextAssembler;

/// Outcome of one shadow search attempt: id set and wall-clock time
type ShadowOutcome = Option<(HashSet<String>, Duration)>;

/// Sequences the retrieval pipeline for one query at a time
///
/// Holds shared capability handles built once at startup; each `handle` call
/// is independent and stateless apart from the append-only metric sinks.
pub struct QueryOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    primary: Arc<dyn VectorSearchProvider>,
    shadow: Option<Arc<dyn VectorSearchProvider>>,
    assembler: ContextAssembler,
    llm: Arc<dyn LlmProvider>,
    metrics: Arc<SearchMetrics>,
    shadow_timeout: Duration,
}

impl QueryOrchestrator {
    /// Create an orchestrator over the given capabilities
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        primary: Arc<dyn VectorSearchProvider>,
        shadow: Option<Arc<dyn VectorSearchProvider>>,
        assembler: ContextAssembler,
        llm: Arc<dyn LlmProvider>,
        metrics: Arc<SearchMetrics>,
        shadow_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            primary,
            shadow,
            assembler,
            llm,
            metrics,
            shadow_timeout,
        }
    }

    /// Shared comparison sinks
    pub fn metrics(&self) -> &Arc<SearchMetrics> {
        &self.metrics
    }

    /// Answer one query
    ///
    /// Fails only when a required dependency (embedding, primary search,
    /// generation) is unavailable or malformed. Invalid input is rejected
    /// before any external call.
    pub async fn handle(&self, request: QueryRequest) -> Result<QueryResponse> {
        request.validate()?;

        let started = Instant::now();
        tracing::info!("Processing query: \"{}\"", request.question);

        // 1) Embed - no retrieval without an embedding
        let embed_started = Instant::now();
        let embedding = self.embedder.embed(&request.question).await?;
        let embed_ms = embed_started.elapsed().as_millis() as u64;

        // 2) Launch the shadow search before blocking on the primary. If the
        // primary fails below, the orphaned task expires on its own timeout.
        let shadow_task = self.spawn_shadow_search(&embedding, request.top_k);

        // 3) Primary search - the critical path
        let search_started = Instant::now();
        let hits = self.primary.search(&embedding, request.top_k).await?;
        let primary_latency = search_started.elapsed();
        let search_ms = primary_latency.as_millis() as u64;

        let primary_ids: HashSet<String> = hits.iter().map(|h| h.id.clone()).collect();
        self.spawn_comparison(shadow_task, primary_ids, primary_latency, request.top_k);

        // 4) Zero hits from the authoritative index: short-circuit
        if hits.is_empty() {
            return Ok(QueryResponse::no_documents(StageTimings {
                embed: embed_ms,
                search: search_ms,
                llm: 0,
                total: started.elapsed().as_millis() as u64,
            }));
        }

        // 5) Assemble context and generate. Hits without resolvable text
        // yield an empty context, which gets an explanatory answer instead
        // of a generator call.
        let (context, sources) = self.assembler.assemble(&hits).await;

        let llm_started = Instant::now();
        let answer = if context.is_empty() {
            NO_EXTRACTED_TEXT_ANSWER.to_string()
        } else {
            self.llm.generate(&request.question, &context).await?
        };
        let llm_ms = llm_started.elapsed().as_millis() as u64;

        Ok(QueryResponse {
            answer,
            sources,
            timings_ms: StageTimings {
                embed: embed_ms,
                search: search_ms,
                llm: llm_ms,
                total: started.elapsed().as_millis() as u64,
            },
        })
    }

    /// Start the time-boxed shadow search on its own task
    ///
    /// Failure and timeout both collapse to `None`; they are logged here and
    /// surface nowhere else.
    fn spawn_shadow_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Option<JoinHandle<ShadowOutcome>> {
        let searcher = Arc::clone(self.shadow.as_ref()?);
        let vector = embedding.to_vec();
        let timeout = self.shadow_timeout;

        Some(tokio::spawn(async move {
            let started = Instant::now();
            match tokio::time::timeout(timeout, searcher.search(&vector, top_k)).await {
                Ok(Ok(hits)) => {
                    let ids = hits.into_iter().map(|h| h.id).collect();
                    Some((ids, started.elapsed()))
                }
                Ok(Err(e)) => {
                    tracing::warn!("Shadow search failed: {}", e);
                    None
                }
                Err(_) => {
                    tracing::warn!("Shadow search timed out after {:?}", timeout);
                    None
                }
            }
        }))
    }

    /// Join the shadow outcome and feed the recorder, off the response path
    fn spawn_comparison(
        &self,
        shadow_task: Option<JoinHandle<ShadowOutcome>>,
        primary_ids: HashSet<String>,
        primary_latency: Duration,
        top_k: usize,
    ) {
        let metrics = Arc::clone(&self.metrics);

        let Some(task) = shadow_task else {
            metrics.record(&primary_ids, None, primary_latency, None, top_k);
            return;
        };

        tokio::spawn(async move {
            // The task is already bounded by the shadow timeout; a panic in
            // it is absorbed the same way as a failure.
            let outcome = task.await.unwrap_or(None);
            match outcome {
                Some((shadow_ids, shadow_latency)) => metrics.record(
                    &primary_ids,
                    Some(&shadow_ids),
                    primary_latency,
                    Some(shadow_latency),
                    top_k,
                ),
                None => metrics.record(&primary_ids, None, primary_latency, None, top_k),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::Error;
    use crate::providers::SearchHit;
    use crate::types::response::NO_DOCUMENTS_ANSWER;

    struct FixedEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(Error::embedding("embeddings engine unreachable"));
            }
            Ok(vec![0.1; 1024])
        }

        fn dimensions(&self) -> usize {
            1024
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(!self.fail)
        }

        fn name(&self) -> &str {
            "fixed-embedder"
        }
    }

    struct FixedSearcher {
        hits: Vec<SearchHit>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl FixedSearcher {
        fn with_hits(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                fail: false,
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                hits: Vec::new(),
                fail: true,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl VectorSearchProvider for FixedSearcher {
        async fn search(&self, _vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::vector_db("backend unreachable"));
            }
            Ok(self.hits.iter().take(limit).cloned().collect())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(!self.fail)
        }

        fn name(&self) -> &str {
            "fixed-searcher"
        }
    }

    struct FixedLlm {
        calls: AtomicUsize,
    }

    impl FixedLlm {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn generate(&self, _question: &str, _context: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Keep the llm stage measurably non-zero
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok("The refund policy allows returns within 30 days.".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fixed-llm"
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn text_hit(id: &str, score: f32, text: &str) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            payload: [("text".to_string(), json!(text))].into_iter().collect(),
        }
    }

    fn orchestrator(
        primary: FixedSearcher,
        shadow: Option<FixedSearcher>,
    ) -> (QueryOrchestrator, Arc<FixedLlm>) {
        let llm = Arc::new(FixedLlm::new());
        let orchestrator = QueryOrchestrator::new(
            Arc::new(FixedEmbedder { fail: false }),
            Arc::new(primary),
            shadow.map(|s| Arc::new(s) as Arc<dyn VectorSearchProvider>),
            ContextAssembler::new(None),
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            Arc::new(SearchMetrics::new("qdrant", "pgvector")),
            Duration::from_millis(200),
        );
        (orchestrator, llm)
    }

    /// Give detached comparison tasks time to run
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_end_to_end_with_shadow_overlap() {
        let primary = FixedSearcher::with_hits(vec![
            text_hit("a", 0.91, "alpha"),
            text_hit("b", 0.88, "beta"),
            text_hit("c", 0.80, "gamma"),
        ]);
        let shadow = FixedSearcher::with_hits(vec![
            SearchHit::bare("a", 0.93),
            SearchHit::bare("c", 0.79),
        ]);
        let (orchestrator, _llm) = orchestrator(primary, Some(shadow));

        let response = orchestrator
            .handle(QueryRequest::new("What is the refund policy?").with_top_k(3))
            .await
            .unwrap();

        assert!(!response.answer.is_empty());
        let ids: Vec<&str> = response.sources.iter().map(|s| s.chunk_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(response.timings_ms.llm > 0);

        settle().await;
        let snapshot = orchestrator.metrics().snapshot();
        let overlap = snapshot.search_overlap.last_ratio.unwrap();
        assert!((overlap - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.search_latency["pgvector"].count, 1);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_call() {
        let (orchestrator, llm) = orchestrator(FixedSearcher::failing(), None);

        let err = orchestrator
            .handle(QueryRequest::new("hi").with_top_k(3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        // No search latency observed either: validation failed first
        settle().await;
        assert!(orchestrator.metrics().snapshot().search_latency.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_is_dependency_error() {
        let llm = Arc::new(FixedLlm::new());
        let orchestrator = QueryOrchestrator::new(
            Arc::new(FixedEmbedder { fail: true }),
            Arc::new(FixedSearcher::with_hits(vec![text_hit("a", 0.9, "alpha")])),
            None,
            ContextAssembler::new(None),
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            Arc::new(SearchMetrics::new("qdrant", "pgvector")),
            Duration::from_millis(200),
        );

        let err = orchestrator
            .handle(QueryRequest::new("What is the refund policy?"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_zero_hits_short_circuits_without_llm() {
        let (orchestrator, llm) = orchestrator(FixedSearcher::with_hits(vec![]), None);

        let response = orchestrator
            .handle(QueryRequest::new("What is the refund policy?"))
            .await
            .unwrap();

        assert_eq!(response.answer, NO_DOCUMENTS_ANSWER);
        assert!(response.sources.is_empty());
        assert_eq!(response.timings_ms.llm, 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        // The primary latency observation is still recorded
        settle().await;
        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.search_latency["qdrant"].count, 1);
    }

    #[tokio::test]
    async fn test_unresolvable_hits_get_distinct_answer() {
        // Hits exist but carry neither inline text nor a blob key
        let primary = FixedSearcher::with_hits(vec![SearchHit::bare("a", 0.9)]);
        let (orchestrator, llm) = orchestrator(primary, None);

        let response = orchestrator
            .handle(QueryRequest::new("What is the refund policy?"))
            .await
            .unwrap();

        assert_eq!(response.answer, NO_EXTRACTED_TEXT_ANSWER);
        assert_ne!(response.answer, NO_DOCUMENTS_ANSWER);
        assert!(response.sources.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shadow_failure_never_affects_response() {
        let primary = FixedSearcher::with_hits(vec![text_hit("a", 0.9, "alpha")]);
        let (orchestrator, _llm) = orchestrator(primary, Some(FixedSearcher::failing()));

        let response = orchestrator
            .handle(QueryRequest::new("What is the refund policy?"))
            .await
            .unwrap();

        assert!(!response.answer.is_empty());
        assert_eq!(response.sources.len(), 1);

        // Only the overlap observation is suppressed
        settle().await;
        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.search_latency["qdrant"].count, 1);
        assert!(!snapshot.search_latency.contains_key("pgvector"));
        assert_eq!(snapshot.search_overlap.observations, 0);
    }

    #[tokio::test]
    async fn test_shadow_timeout_does_not_delay_response() {
        let primary = FixedSearcher::with_hits(vec![text_hit("a", 0.9, "alpha")]);
        let mut slow_shadow = FixedSearcher::with_hits(vec![SearchHit::bare("a", 0.9)]);
        slow_shadow.delay = Some(Duration::from_secs(10));
        let (orchestrator, _llm) = orchestrator(primary, Some(slow_shadow));

        let started = Instant::now();
        let response = orchestrator
            .handle(QueryRequest::new("What is the refund policy?"))
            .await
            .unwrap();
        // Response returns on the primary path; the 10s shadow never gates it
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response.sources.len(), 1);

        // After the shadow timeout passes, only primary latency was recorded
        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.search_overlap.observations, 0);
        assert_eq!(snapshot.search_latency["qdrant"].count, 1);
    }

    #[tokio::test]
    async fn test_primary_failure_propagates() {
        let (orchestrator, llm) = orchestrator(
            FixedSearcher::failing(),
            Some(FixedSearcher::with_hits(vec![SearchHit::bare("a", 0.9)])),
        );

        let err = orchestrator
            .handle(QueryRequest::new("What is the refund policy?"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
