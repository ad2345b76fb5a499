//! Configuration for the query service

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embeddings engine configuration
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    /// Primary search (Qdrant) configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Shadow search (Postgres/pgvector) configuration
    #[serde(default)]
    pub shadow: ShadowConfig,
    /// Blob store configuration for fallback chunk-text fetches
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Build configuration from defaults overlaid with environment variables
    ///
    /// Recognized variables: `EMBEDDINGS_ENGINE_URL`, `EMBEDDINGS_ENDPOINT`,
    /// `QDRANT_URL`, `QDRANT_COLLECTION`, `SHADOW_DATABASE_URL`,
    /// `BLOB_STORE_URL`, `LLM_BASE_URL`, `LLM_API_KEY`, `LLM_MODEL`,
    /// `SERVER_HOST`, `SERVER_PORT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("EMBEDDINGS_ENGINE_URL") {
            config.embeddings.service_url = url;
        }
        if let Ok(endpoint) = std::env::var("EMBEDDINGS_ENDPOINT") {
            config.embeddings.endpoint = endpoint;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.search.url = url;
        }
        if let Ok(collection) = std::env::var("QDRANT_COLLECTION") {
            config.search.collection = collection;
        }
        if let Ok(url) = std::env::var("SHADOW_DATABASE_URL") {
            if !url.is_empty() {
                config.shadow.database_url = Some(url);
            }
        }
        if let Ok(url) = std::env::var("BLOB_STORE_URL") {
            if !url.is_empty() {
                config.blob_store.base_url = Some(url);
            }
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            if !key.is_empty() {
                config.llm.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(host) = std::env::var("SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        config
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Embeddings engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Base URL of the embeddings engine
    pub service_url: String,
    /// Embedding endpoint path
    pub endpoint: String,
    /// Expected embedding dimensionality
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8001".to_string(),
            endpoint: "/embed".to_string(),
            dimensions: 1024,
            timeout_secs: 30,
        }
    }
}

/// Primary search (Qdrant) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Qdrant base URL
    pub url: String,
    /// Collection name
    pub collection: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "faro_docs".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Shadow search configuration
///
/// The shadow backend is telemetry-only; leaving `database_url` unset
/// disables the comparison entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Postgres connection string (pgvector extension required)
    #[serde(default)]
    pub database_url: Option<String>,
    /// Table holding `(id, vector)` rows
    pub table: String,
    /// Upper bound on how long a shadow search may run, in milliseconds
    pub timeout_ms: u64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            table: "embeddings".to_string(),
            timeout_ms: 1000,
        }
    }
}

/// Blob store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Base URL of the blob gateway; unset disables fallback text fetches
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_blob_timeout")]
    pub timeout_secs: u64,
}

fn default_blob_timeout() -> u64 {
    10
}

/// LLM configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// API key; unset switches generation to the degraded preview answer
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}
