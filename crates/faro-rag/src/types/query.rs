//! Query request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum question length in characters
pub const MIN_QUESTION_CHARS: usize = 3;
/// Maximum question length in characters
pub const MAX_QUESTION_CHARS: usize = 2000;
/// Maximum number of chunks a query may request
pub const MAX_TOP_K: usize = 20;

/// Query request for the retrieval pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (default: 5)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl QueryRequest {
    /// Create a new query with the default top_k
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: default_top_k(),
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// Validate request bounds, rejecting before any external call is made
    pub fn validate(&self) -> Result<()> {
        let chars = self.question.chars().count();
        if chars < MIN_QUESTION_CHARS {
            return Err(Error::validation(format!(
                "question must be at least {} characters, got {}",
                MIN_QUESTION_CHARS, chars
            )));
        }
        if chars > MAX_QUESTION_CHARS {
            return Err(Error::validation(format!(
                "question must be at most {} characters, got {}",
                MAX_QUESTION_CHARS, chars
            )));
        }
        if self.top_k < 1 || self.top_k > MAX_TOP_K {
            return Err(Error::validation(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, self.top_k
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        assert!(QueryRequest::new("What is the refund policy?").validate().is_ok());
        assert!(QueryRequest::new("abc").with_top_k(1).validate().is_ok());
        assert!(QueryRequest::new("abc").with_top_k(20).validate().is_ok());
    }

    #[test]
    fn test_question_too_short() {
        let err = QueryRequest::new("ab").validate().unwrap_err();
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_question_too_long() {
        let question: String = std::iter::repeat('x').take(2001).collect();
        let err = QueryRequest::new(question).validate().unwrap_err();
        assert!(err.to_string().contains("at most 2000"));
    }

    #[test]
    fn test_question_length_counts_chars_not_bytes() {
        // 2000 multi-byte characters is still within bounds
        let question: String = std::iter::repeat('ü').take(2000).collect();
        assert!(QueryRequest::new(question).validate().is_ok());
    }

    #[test]
    fn test_top_k_bounds() {
        assert!(QueryRequest::new("valid question").with_top_k(0).validate().is_err());
        assert!(QueryRequest::new("valid question").with_top_k(21).validate().is_err());
    }

    #[test]
    fn test_top_k_defaults_when_missing() {
        let request: QueryRequest = serde_json::from_str(r#"{"question": "hello"}"#).unwrap();
        assert_eq!(request.top_k, 5);
    }
}
