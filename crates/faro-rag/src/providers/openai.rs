//! OpenAI-compatible chat completions client for answer generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::LlmProvider;

/// How much context the degraded keyless answer echoes back
const DEGRADED_PREVIEW_CHARS: usize = 1000;

/// Answer generation client for an OpenAI-compatible `/chat/completions` API
///
/// Without an API key the client does not fail: it synthesizes a
/// deterministic answer echoing a context preview, so retrieval stays
/// usable in environments with no generation credentials.
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "You are a helpful RAG assistant. \
    Answer the user's question using ONLY the provided context below. \
    If the context does not contain the answer, state that you cannot find the information.";

impl ChatCompletionsClient {
    /// Create a new chat completions client
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Whether the client is running without credentials
    pub fn is_degraded(&self) -> bool {
        self.api_key.is_none()
    }

    /// Deterministic answer used when no API key is configured
    fn degraded_answer(context: &str) -> String {
        let preview: String = context.chars().take(DEGRADED_PREVIEW_CHARS).collect();
        format!(
            "Answer: no LLM credentials configured. Retrieval worked; here is a context preview.\n\n{}\n\n",
            preview
        )
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsClient {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return Ok(Self::degraded_answer(context)),
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("CONTEXT:\n{}\n\nQUESTION:\n{}\n", context, question),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::llm("LLM returned no choices".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        // Keyless mode is always "healthy": it answers deterministically
        Ok(true)
    }

    fn name(&self) -> &str {
        "chat-completions"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
