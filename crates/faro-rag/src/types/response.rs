//! Response types for retrieval queries

use serde::{Deserialize, Serialize};

/// Answer returned when the primary search finds no hits at all
pub const NO_DOCUMENTS_ANSWER: &str = "Answer: No relevant documents found.";

/// Answer returned when hits were found but none yielded resolvable text
pub const NO_EXTRACTED_TEXT_ANSWER: &str =
    "Error: Found documents but failed to extract text content.";

/// A source chunk backing the answer, in primary-hit order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Similarity score (higher is more relevant)
    pub score: f32,
    /// Chunk identifier from the primary search backend
    pub chunk_id: String,
    /// Owning document identifier, when the payload carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Document title, when the payload carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Blob store key the chunk text lives under, when the payload carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
}

/// Wall-clock duration of each pipeline stage in milliseconds
///
/// `total` covers the whole request and includes uninstrumented overhead, so
/// it may exceed the sum of the individual stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTimings {
    /// Embedding stage
    pub embed: u64,
    /// Primary search stage (the shadow search is never on this clock)
    pub search: u64,
    /// Generation stage; 0 when the pipeline short-circuited before the LLM
    pub llm: u64,
    /// End-to-end request duration
    pub total: u64,
}

/// Response from a retrieval query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Sources whose text made it into the answer context
    pub sources: Vec<Source>,
    /// Per-stage timings in milliseconds
    pub timings_ms: StageTimings,
}

impl QueryResponse {
    /// Short-circuit response for a primary search that returned zero hits
    pub fn no_documents(timings: StageTimings) -> Self {
        Self {
            answer: NO_DOCUMENTS_ANSWER.to_string(),
            sources: Vec::new(),
            timings_ms: timings,
        }
    }
}
