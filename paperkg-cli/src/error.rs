//! Workspace-wide error aggregate. Lives here rather than in
//! `paperkg-core` because every subsystem crate depends on `paperkg-core`
//! — aggregating their error types there would be circular. `paperkg-cli`
//! is the one crate that legitimately depends on all of them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaperKgError {
    #[error(transparent)]
    Ingestion(#[from] paperkg_ingestion::IngestionError),

    #[error(transparent)]
    Reasoner(#[from] paperkg_reasoner::ReasonerError),

    #[error(transparent)]
    Temporal(#[from] paperkg_temporal::TemporalError),

    #[error(transparent)]
    Graph(#[from] paperkg_storage::GraphError),

    #[error(transparent)]
    Config(#[from] paperkg_core::ConfigError),
}
