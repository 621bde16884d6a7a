//! Errors surfaced by the multi-hop reasoner.

use paperkg_core::Retryable;
use paperkg_storage::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("store error during traversal: {0}")]
    Store(#[from] GraphError),

    #[error("path query is invalid: {0}")]
    InvalidQuery(String),
}

impl Retryable for ReasonerError {
    fn is_retryable(&self) -> bool {
        matches!(self, ReasonerError::Store(err) if err.is_retryable())
    }
}
