//! Error taxonomy for the normalization cascade.

use paperkg_core::Retryable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("invalid regex in normalization rule {rule_id}: {message}")]
    InvalidRule { rule_id: String, message: String },

    #[error("alias store failure: {0}")]
    AliasStore(String),

    #[error(transparent)]
    Llm(#[from] paperkg_llm::LlmError),
}

impl Retryable for NormalizationError {
    fn is_retryable(&self) -> bool {
        match self {
            NormalizationError::Llm(e) => e.is_retryable(),
            _ => false,
        }
    }
}
