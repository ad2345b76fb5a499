//! Qdrant REST client, the primary search backend

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

use super::vector_search::{SearchHit, VectorSearchProvider};

/// Similarity search client for a Qdrant collection
pub struct QdrantSearcher {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    /// Qdrant point ids are either integers or UUID strings
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: Option<HashMap<String, serde_json::Value>>,
}

impl QdrantSearcher {
    /// Create a new Qdrant search client
    pub fn new(config: &SearchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        )
    }

    fn point_id_to_string(id: &serde_json::Value) -> String {
        match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl VectorSearchProvider for QdrantSearcher {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let request = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
            "with_vector": false,
        });

        let response = self
            .client
            .post(self.search_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Qdrant search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Qdrant search failed ({}): {}",
                status, body
            )));
        }

        let search_response: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse Qdrant response: {}", e)))?;

        let hits = search_response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: Self::point_id_to_string(&point.id),
                score: point.score,
                payload: point.payload.unwrap_or_default(),
            })
            .collect();

        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
