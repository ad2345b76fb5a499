//! faro-rag: query-time retrieval orchestration with shadow-search telemetry
//!
//! This crate answers natural-language questions by embedding the question,
//! searching the authoritative vector index, and generating an answer from
//! the retrieved chunk text. A secondary index is searched in the shadow of
//! every query, purely to measure result agreement and latency between the
//! two backends; it never affects the answer.

pub mod config;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use retrieval::QueryOrchestrator;
pub use types::{QueryRequest, QueryResponse, Source};
