//! Embedding provider trait for converting question text to a vector

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `EmbedServiceClient`: HTTP embeddings engine
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    ///
    /// A transport failure, timeout, or empty/mis-sized vector is a
    /// dependency error.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimensionality (1024 for the faro index)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
