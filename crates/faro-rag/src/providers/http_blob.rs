//! Blob gateway client for fallback chunk-text fetches

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::BlobStoreConfig;
use crate::error::{Error, Result};

use super::blob_store::BlobStoreProvider;

/// Fetches raw chunk text by opaque key from an HTTP blob gateway
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
}

impl HttpBlobStore {
    /// Create a new blob store client
    ///
    /// Fails when `blob_store.base_url` is not configured.
    pub fn new(config: &BlobStoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("blob_store.base_url is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BlobStoreProvider for HttpBlobStore {
    async fn fetch_text(&self, key: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, key.trim_start_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("Blob fetch failed for {}: {}", key, e)))?;

        if !response.status().is_success() {
            return Err(Error::internal(format!(
                "Blob fetch failed for {}: HTTP {}",
                key,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::internal(format!("Blob body read failed for {}: {}", key, e)))
    }

    fn name(&self) -> &str {
        "http-blob-store"
    }
}
