//! Payload field resolution for search-hit payloads
//!
//! Backends historically wrote the same logical field under different keys.
//! Each logical field gets one explicit, ordered alias list; the first
//! non-empty value wins.

use serde_json::Value;
use std::collections::HashMap;

/// Inline chunk text
pub const TEXT_KEYS: &[&str] = &["text", "chunk_text"];

/// Blob store key for fallback text retrieval
pub const BLOB_KEY_KEYS: &[&str] = &["s3_key", "s3Key", "key"];

/// Owning document identifier
pub const DOCUMENT_ID_KEYS: &[&str] = &["document_id", "doc_id"];

/// Document title
pub const TITLE_KEYS: &[&str] = &["title"];

/// Resolve a logical field to its first non-empty value in alias order
///
/// String values are taken as-is; numeric values are stringified (some
/// ingest paths wrote numeric document ids). Empty strings count as absent.
pub fn resolve(payload: &HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_alias_priority_order() {
        let p = payload(&[
            ("chunk_text", json!("fallback text")),
            ("text", json!("primary text")),
        ]);
        assert_eq!(resolve(&p, TEXT_KEYS), Some("primary text".to_string()));
    }

    #[test]
    fn test_empty_string_falls_through() {
        let p = payload(&[("text", json!("")), ("chunk_text", json!("real text"))]);
        assert_eq!(resolve(&p, TEXT_KEYS), Some("real text".to_string()));
    }

    #[test]
    fn test_blob_key_aliases() {
        let p = payload(&[("key", json!("chunks/3.txt"))]);
        assert_eq!(resolve(&p, BLOB_KEY_KEYS), Some("chunks/3.txt".to_string()));

        let p = payload(&[
            ("key", json!("chunks/3.txt")),
            ("s3Key", json!("chunks/2.txt")),
            ("s3_key", json!("chunks/1.txt")),
        ]);
        // s3_key outranks s3Key outranks key
        assert_eq!(resolve(&p, BLOB_KEY_KEYS), Some("chunks/1.txt".to_string()));
    }

    #[test]
    fn test_numeric_values_stringify() {
        let p = payload(&[("document_id", json!(42))]);
        assert_eq!(resolve(&p, DOCUMENT_ID_KEYS), Some("42".to_string()));
    }

    #[test]
    fn test_absent_returns_none() {
        let p = payload(&[("other", json!("x"))]);
        assert_eq!(resolve(&p, TEXT_KEYS), None);
        assert_eq!(resolve(&HashMap::new(), BLOB_KEY_KEYS), None);
    }
}
