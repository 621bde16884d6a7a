//! The closed NLQ error taxonomy, surfaced to callers as a single typed
//! error object rather than an exception hierarchy.

use paperkg_core::{NlqErrorCode, Retryable};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct NlqError {
    pub code: NlqErrorCode,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl NlqError {
    pub fn new(code: NlqErrorCode, message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self { code, message: message.into(), suggestions }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(NlqErrorCode::Parse, message, vec!["Rephrase the query or simplify the request".to_string()])
    }

    pub fn generation(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::new(NlqErrorCode::Generation, message, suggestions)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(NlqErrorCode::Validation, message, vec!["Check that referenced labels and properties exist in the schema".to_string()])
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(NlqErrorCode::Execution, message, vec!["Check store connectivity and query complexity".to_string()])
    }

    pub fn llm_unavailable() -> Self {
        Self::new(NlqErrorCode::LlmUnavailable, "no LLM provider is available to generate a query", vec!["Configure an LLM provider".to_string()])
    }
}

impl Retryable for NlqError {
    fn is_retryable(&self) -> bool {
        matches!(self.code, NlqErrorCode::Validation)
    }
}
