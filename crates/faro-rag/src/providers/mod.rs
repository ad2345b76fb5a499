//! Provider abstractions for embeddings, vector search, generation, and blob storage
//!
//! Each external dependency of the query pipeline is a trait-based capability;
//! concrete clients are constructed once at startup and injected as shared
//! handles.

pub mod blob_store;
pub mod embedding;
pub mod llm;
pub mod vector_search;

pub mod embed_service;
pub mod http_blob;
pub mod openai;
pub mod pgvector;
pub mod qdrant;

pub use blob_store::BlobStoreProvider;
pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use vector_search::{SearchHit, VectorSearchProvider};
