//! Vector search provider trait for similarity search over an external index

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// A single hit from a similarity search, in backend score order
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Opaque chunk identifier
    pub id: String,
    /// Similarity score (higher is more relevant)
    pub score: f32,
    /// Backend payload; may carry chunk text and metadata under alias keys
    pub payload: HashMap<String, serde_json::Value>,
}

impl SearchHit {
    /// Create a hit with an empty payload (shadow backends return ids only)
    pub fn bare(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            payload: HashMap::new(),
        }
    }
}

/// Trait for similarity search against a vector index
///
/// Implementations:
/// - `QdrantSearcher`: primary index over the Qdrant REST API
/// - `PgVectorSearcher`: shadow index over Postgres/pgvector
///
/// Hits are returned sorted by descending score. Failures are dependency
/// errors; whether they propagate is the caller's policy (the orchestrator
/// absorbs shadow failures).
#[async_trait]
pub trait VectorSearchProvider: Send + Sync {
    /// Search for the `limit` nearest chunks to `vector`
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging and metric labels
    fn name(&self) -> &str;
}
