//! Blob store provider trait for fallback chunk-text retrieval

use async_trait::async_trait;

use crate::error::Result;

/// Trait for fetching raw chunk text by opaque key
///
/// Used only when a search hit's payload carries no inline text.
///
/// Implementations:
/// - `HttpBlobStore`: blob gateway speaking plain HTTP
#[async_trait]
pub trait BlobStoreProvider: Send + Sync {
    /// Fetch the text stored under `key`
    async fn fetch_text(&self, key: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
