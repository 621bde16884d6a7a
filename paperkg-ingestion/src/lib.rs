//! Paper ingestion: rate-limited source clients, deduplication, open-access
//! enrichment gated behind a circuit breaker, and cron-like scheduling of
//! recurring ingestion runs.

mod circuit_breaker;
mod clients;
mod deduplicator;
mod error;
mod schedule;
mod service;

pub use circuit_breaker::CircuitBreaker;
pub use clients::{
    ArxivClient, BibliographicSourceClient, OpenAccessClient, OpenAccessRecord, OpenAlexStyleClient,
};
pub use deduplicator::{check_duplicate, check_duplicates, DuplicateVerdict, MIN_AUTHOR_MATCHES, TAU_CANDIDATE, TAU_EXACT};
pub use error::{CircuitOpenError, IngestionError, SourceError};
pub use schedule::{CronField, CronSchedule, JobStatus, ScheduleRunner};
pub use service::{ExistingPapersSource, IngestOptions, IngestionResult, IngestionService, IngestionSink};
