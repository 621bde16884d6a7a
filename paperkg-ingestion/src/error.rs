//! Error taxonomy for the ingestion pipeline.

use paperkg_core::Retryable;
use thiserror::Error;

/// A source-client failure, carrying enough shape for the retry helper and
/// the circuit breaker to classify it without string-matching.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("{source}: rate limited (status {status})")]
    RateLimited { source: String, status: u16 },

    #[error("{source}: upstream server error (status {status})")]
    UpstreamServerError { source: String, status: u16 },

    #[error("{source}: request timed out")]
    Timeout { source: String },

    #[error("{source}: not found")]
    NotFound { source: String },

    #[error("{source}: client error (status {status}): {message}")]
    ClientError { source: String, status: u16, message: String },

    #[error("{source}: transport failure: {message}")]
    Transport { source: String, message: String },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            SourceError::RateLimited { source, .. }
            | SourceError::UpstreamServerError { source, .. }
            | SourceError::Timeout { source }
            | SourceError::NotFound { source }
            | SourceError::ClientError { source, .. }
            | SourceError::Transport { source, .. } => source,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::RateLimited { status, .. }
            | SourceError::UpstreamServerError { status, .. }
            | SourceError::ClientError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::RateLimited { .. } | SourceError::UpstreamServerError { .. } | SourceError::Timeout { .. } | SourceError::Transport { .. }
        )
    }
}

/// Raised by the open-access client when its circuit breaker is open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("circuit open for {client}, retry after cooldown")]
pub struct CircuitOpenError {
    pub client: String,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    #[error("ingestion sink rejected a paper: {0}")]
    SinkRejected(String),

    #[error("configuration error: {0}")]
    Config(#[from] paperkg_core::ConfigError),
}

impl Retryable for IngestionError {
    fn is_retryable(&self) -> bool {
        match self {
            IngestionError::Source(e) => e.is_retryable(),
            _ => false,
        }
    }
}
