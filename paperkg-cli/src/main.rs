//! PaperKG command-line entry point.
//!
//! Bootstraps telemetry and configuration, wires the shared rate limiter
//! into both source clients, and runs a single ingestion pass. There is no
//! HTTP surface here — scheduling, the graph store, the NLQ engine, the
//! reasoner, and the temporal forecaster are library APIs other binaries
//! (or tests) drive directly.

mod config;
mod error;
mod telemetry;

use config::PaperKgConfig;
use error::PaperKgError;
use paperkg_core::Paper;
use paperkg_ingestion::{
    ArxivClient, CircuitBreaker, ExistingPapersSource, IngestOptions, IngestionService, IngestionSink,
    OpenAlexStyleClient,
};
use paperkg_ratelimit::TokenBucketRateLimiter;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-process "already known" set and ingestion sink. A real deployment
/// backs both with the graph store; this is enough to drive and observe a
/// pipeline run without one.
struct InMemoryPaperLedger {
    papers: Mutex<Vec<Paper>>,
}

impl InMemoryPaperLedger {
    fn new() -> Self {
        Self { papers: Mutex::new(Vec::new()) }
    }
}

#[async_trait::async_trait]
impl ExistingPapersSource for InMemoryPaperLedger {
    async fn snapshot(&self) -> Vec<Paper> {
        self.papers.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl IngestionSink for InMemoryPaperLedger {
    async fn accept(&self, papers: &[Paper]) -> Result<(), String> {
        self.papers.lock().await.extend_from_slice(papers);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), PaperKgError> {
    telemetry::init_tracing(&telemetry::TelemetryConfig::default());
    let config = PaperKgConfig::from_env();
    tracing::info!(query = %config.default_query, max_results = config.default_max_results, "starting paperkg ingestion run");

    // One rate limiter, shared by every source client — the ambient
    // requirement the thin CLI still owns even with no web framework.
    let rate_limiter = Arc::new(TokenBucketRateLimiter::new(
        config.rate_limiter_max_tokens,
        config.rate_limiter_refill_rate,
    ));

    let bibliographic = Arc::new(ArxivClient::new(config.bibliographic_base_url.clone(), rate_limiter.clone()));
    let open_access = Arc::new(OpenAlexStyleClient::new(
        config.open_access_base_url.clone(),
        config.open_access_contact_email.clone(),
        rate_limiter.clone(),
    ));
    let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker_threshold, config.circuit_breaker_reset_after));
    let ledger = Arc::new(InMemoryPaperLedger::new());

    let service = IngestionService::new(bibliographic, Some(open_access), circuit_breaker, ledger.clone(), ledger);

    if config.ingestion_schedule_enabled {
        service
            .schedule_ingestion("default", &config.ingestion_schedule_cron, true)
            .await
            .map_err(PaperKgError::Ingestion)?;
        service
            .start_schedule(
                "default",
                IngestOptions { query: config.default_query.clone(), max_results: config.default_max_results },
            )
            .await
            .ok();
        tracing::info!(cron = %config.ingestion_schedule_cron, "ingestion schedule started, running indefinitely");
        std::future::pending::<()>().await;
        return Ok(());
    }

    let result = service
        .ingest_from_arxiv(&IngestOptions { query: config.default_query.clone(), max_results: config.default_max_results })
        .await;

    tracing::info!(
        total_fetched = result.total_fetched,
        new_papers = result.new_papers.len(),
        duplicates_skipped = result.duplicates_skipped,
        duration_ms = result.duration_ms,
        errors = result.errors.len(),
        "ingestion run complete"
    );
    for error in &result.errors {
        tracing::warn!(%error, "ingestion error");
    }

    Ok(())
}
