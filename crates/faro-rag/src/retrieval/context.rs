//! Context assembly from primary search hits
//!
//! Turns a scored hit list into the text block handed to the generator plus
//! the user-facing source list. A hit whose text cannot be resolved (no
//! inline payload text, and the blob fallback failed or returned nothing)
//! is dropped from both, silently.

use std::sync::Arc;

use crate::providers::{BlobStoreProvider, SearchHit};
use crate::types::response::Source;

use super::payload;

/// Maximum context length in characters, measured after joining
pub const MAX_CONTEXT_CHARS: usize = 15_000;

/// Separator between chunk texts in the assembled context
const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Assembles the answer context from primary search hits
pub struct ContextAssembler {
    blob_store: Option<Arc<dyn BlobStoreProvider>>,
}

impl ContextAssembler {
    /// Create an assembler; without a blob store, payload-less hits are dropped
    pub fn new(blob_store: Option<Arc<dyn BlobStoreProvider>>) -> Self {
        Self { blob_store }
    }

    /// Build the context block and source list from hits in score order
    ///
    /// Never fails; unresolvable hits are excluded. An all-dropped hit list
    /// yields an empty context and empty sources, which the orchestrator
    /// distinguishes from "no hits at all".
    pub async fn assemble(&self, hits: &[SearchHit]) -> (String, Vec<Source>) {
        let mut contexts: Vec<String> = Vec::with_capacity(hits.len());
        let mut sources: Vec<Source> = Vec::with_capacity(hits.len());

        for hit in hits {
            let blob_key = payload::resolve(&hit.payload, payload::BLOB_KEY_KEYS);

            let text = match payload::resolve(&hit.payload, payload::TEXT_KEYS) {
                Some(text) => Some(text),
                None => match &blob_key {
                    Some(key) => {
                        tracing::info!(
                            "Payload text empty for chunk {}, fetching blob: {}",
                            hit.id,
                            key
                        );
                        self.fetch_fallback(key).await
                    }
                    None => None,
                },
            };

            let text = match text {
                Some(text) if !text.is_empty() => text,
                _ => {
                    tracing::warn!("No text found for chunk {}, skipping", hit.id);
                    continue;
                }
            };

            sources.push(Source {
                score: hit.score,
                chunk_id: hit.id.clone(),
                document_id: payload::resolve(&hit.payload, payload::DOCUMENT_ID_KEYS),
                title: payload::resolve(&hit.payload, payload::TITLE_KEYS),
                s3_key: blob_key,
            });
            contexts.push(format!("Content: {}", text));
        }

        let context = truncate_chars(contexts.join(CHUNK_SEPARATOR), MAX_CONTEXT_CHARS);
        tracing::debug!("Assembled context: {} chars", context.chars().count());

        (context, sources)
    }

    async fn fetch_fallback(&self, key: &str) -> Option<String> {
        let store = match &self.blob_store {
            Some(store) => store,
            None => {
                tracing::warn!("Cannot fetch {}, no blob store configured", key);
                return None;
            }
        };

        match store.fetch_text(key).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Blob fetch failed for {}: {}", key, e);
                None
            }
        }
    }
}

/// Truncate a string to at most `max` characters, dropping the tail
fn truncate_chars(mut s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => {
            s.truncate(byte_idx);
            s
        }
        None => s,
    }
}
