//! Errors surfaced by metrics recording, hot-topic queries, and forecasting.

use paperkg_core::Retryable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemporalError {
    #[error("metrics store error: {0}")]
    Store(String),

    #[error("metrics store is transiently unavailable: {0}")]
    Transient(String),
}

impl Retryable for TemporalError {
    fn is_retryable(&self) -> bool {
        matches!(self, TemporalError::Transient(_))
    }
}
