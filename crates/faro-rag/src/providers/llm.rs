//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `ChatCompletionsClient`: OpenAI-compatible chat completions API
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate an answer given a question and the assembled context
    ///
    /// A provider running without credentials may return a degraded
    /// deterministic answer instead of failing; that is a documented
    /// fallback mode, not an error.
    async fn generate(&self, question: &str, context: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
