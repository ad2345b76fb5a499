//! HTTP client for the embeddings engine

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingsConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Client for the embeddings engine's `/embed` endpoint
pub struct EmbedServiceClient {
    client: Client,
    url: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<Vec<f32>>,
}

impl EmbedServiceClient {
    /// Create a new embeddings engine client
    pub fn new(config: &EmbeddingsConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        let url = format!(
            "{}{}",
            config.service_url.trim_end_matches('/'),
            config.endpoint
        );

        Self {
            client,
            url,
            dimensions: config.dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for EmbedServiceClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Embedding failed: HTTP {} - {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        let embedding = match embed_response.embedding {
            Some(emb) if !emb.is_empty() => emb,
            _ => {
                return Err(Error::embedding(
                    "Embedding service returned no embedding".to_string(),
                ))
            }
        };

        if embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Embedding dimensionality mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(&self.url).send().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "embeddings-engine"
    }
}
