//! Application state for the query server

use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::Result;
use crate::metrics::SearchMetrics;
use crate::providers::{
    embed_service::EmbedServiceClient, http_blob::HttpBlobStore, openai::ChatCompletionsClient,
    pgvector::PgVectorSearcher, qdrant::QdrantSearcher, BlobStoreProvider, EmbeddingProvider,
    LlmProvider, VectorSearchProvider,
};
use crate::retrieval::{ContextAssembler, QueryOrchestrator};

/// Shared application state
///
/// Capability objects are built once here and injected into the
/// orchestrator; request handlers only ever see shared references.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    primary: Arc<dyn VectorSearchProvider>,
    llm: Arc<dyn LlmProvider>,
    metrics: Arc<SearchMetrics>,
    orchestrator: QueryOrchestrator,
}

impl AppState {
    /// Create new application state from configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing query service state...");

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(EmbedServiceClient::new(&config.embeddings));
        tracing::info!(
            "Embeddings engine client initialized ({} dims, {})",
            embedder.dimensions(),
            config.embeddings.service_url
        );

        let primary: Arc<dyn VectorSearchProvider> = Arc::new(QdrantSearcher::new(&config.search));
        tracing::info!(
            "Primary searcher initialized (qdrant, collection {})",
            config.search.collection
        );

        // Shadow backend is optional and connects lazily; a missing or
        // unreachable database only suppresses comparison telemetry.
        let shadow: Option<Arc<dyn VectorSearchProvider>> = match &config.shadow.database_url {
            Some(_) => match PgVectorSearcher::connect_lazy(&config.shadow) {
                Ok(searcher) => {
                    tracing::info!(
                        "Shadow searcher initialized (pgvector, table {}, timeout {}ms)",
                        config.shadow.table,
                        config.shadow.timeout_ms
                    );
                    Some(Arc::new(searcher))
                }
                Err(e) => {
                    tracing::warn!("Shadow searcher disabled: {}", e);
                    None
                }
            },
            None => {
                tracing::info!("Shadow searcher disabled (no database configured)");
                None
            }
        };

        let blob_store: Option<Arc<dyn BlobStoreProvider>> = match &config.blob_store.base_url {
            Some(_) => match HttpBlobStore::new(&config.blob_store) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!("Blob store disabled: {}", e);
                    None
                }
            },
            None => {
                tracing::info!("Blob store disabled (no base URL configured)");
                None
            }
        };

        let llm_client = ChatCompletionsClient::new(&config.llm);
        if llm_client.is_degraded() {
            tracing::warn!("No LLM API key configured; answers degrade to context previews");
        }
        let llm: Arc<dyn LlmProvider> = Arc::new(llm_client);
        tracing::info!("LLM client initialized (model {})", llm.model());

        let metrics = Arc::new(SearchMetrics::new(
            primary.name().to_string(),
            shadow
                .as_ref()
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| "pgvector".to_string()),
        ));

        let orchestrator = QueryOrchestrator::new(
            Arc::clone(&embedder),
            Arc::clone(&primary),
            shadow,
            ContextAssembler::new(blob_store),
            Arc::clone(&llm),
            Arc::clone(&metrics),
            Duration::from_millis(config.shadow.timeout_ms),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                primary,
                llm,
                metrics,
                orchestrator,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query orchestrator
    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.inner.orchestrator
    }

    /// Get the comparison metric sinks
    pub fn metrics(&self) -> &Arc<SearchMetrics> {
        &self.inner.metrics
    }

    /// Get the embedding provider (for readiness probing)
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the primary search provider (for readiness probing)
    pub fn primary_searcher(&self) -> &Arc<dyn VectorSearchProvider> {
        &self.inner.primary
    }

    /// Get the LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }
}
