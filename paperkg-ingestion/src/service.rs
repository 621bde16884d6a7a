//! Orchestrates source clients, the deduplicator, and enrichment into one
//! `IngestionResult` per call, and drives the schedule runner for periodic
//! polling.

use crate::circuit_breaker::CircuitBreaker;
use crate::clients::{BibliographicSourceClient, OpenAccessClient};
use crate::deduplicator::check_duplicates;
use crate::error::IngestionError;
use crate::schedule::{JobStatus, ScheduleRunner};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperkg_core::Paper;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub query: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionResult {
    pub total_fetched: usize,
    pub new_papers: Vec<Paper>,
    pub updated_papers: Vec<Paper>,
    pub duplicates_skipped: usize,
    pub duration_ms: u64,
    pub errors: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Supplies the service with the papers already known, so the
/// deduplicator has something to compare the fetched batch against
/// without the service owning a store dependency directly.
#[async_trait]
pub trait ExistingPapersSource: Send + Sync {
    async fn snapshot(&self) -> Vec<Paper>;
}

/// Receives newly accepted (non-duplicate) papers for downstream
/// persistence/extraction.
#[async_trait]
pub trait IngestionSink: Send + Sync {
    async fn accept(&self, papers: &[Paper]) -> Result<(), String>;
}

/// The dependencies one ingestion run needs, grouped so both a direct call
/// and a scheduled tick can share the same `Arc`-cheap handle.
struct Pipeline {
    bibliographic: Arc<dyn BibliographicSourceClient>,
    open_access: Option<Arc<dyn OpenAccessClient>>,
    circuit_breaker: Arc<CircuitBreaker>,
    existing: Arc<dyn ExistingPapersSource>,
    sink: Arc<dyn IngestionSink>,
    queue_depth: Arc<AtomicUsize>,
}

impl Pipeline {
    async fn ingest(&self, options: &IngestOptions) -> IngestionResult {
        let start = std::time::Instant::now();
        let mut result = IngestionResult { timestamp: Some(Utc::now()), ..Default::default() };

        let fetched = match self.bibliographic.search(&options.query, options.max_results).await {
            Ok(papers) => papers,
            Err(err) => {
                result.errors.push(format!("fetch failed: {err}"));
                result.duration_ms = start.elapsed().as_millis() as u64;
                return result;
            }
        };
        result.total_fetched = fetched.len();
        self.queue_depth.store(fetched.len(), Ordering::SeqCst);

        let existing = self.existing.snapshot().await;
        let verdicts = check_duplicates(&fetched, &existing);

        let mut accepted = Vec::new();
        for (paper, verdict) in fetched.into_iter().zip(verdicts.into_iter()) {
            self.queue_depth.fetch_sub(1, Ordering::SeqCst);
            if verdict.is_duplicate {
                result.duplicates_skipped += 1;
                continue;
            }
            let enriched = self.enrich(paper, &mut result.errors).await;
            accepted.push(enriched);
        }

        if !accepted.is_empty() {
            if let Err(err) = self.sink.accept(&accepted).await {
                result.errors.push(format!("sink rejected batch: {err}"));
            }
        }
        result.new_papers = accepted;
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    /// If the paper carries a DOI and the open-access client is available
    /// (circuit closed), try to merge supplementary fields. Circuit-open
    /// or transient failures are recorded but never abort the paper.
    async fn enrich(&self, mut paper: Paper, errors: &mut Vec<String>) -> Paper {
        let Some(open_access) = &self.open_access else {
            return paper;
        };
        let Some(doi) = paper.doi.clone() else {
            return paper;
        };

        if !self.circuit_breaker.is_available() {
            errors.push(format!("enrichment skipped for {}: circuit open", paper.id));
            return paper;
        }

        match open_access.lookup(&doi).await {
            Ok(Some(record)) => {
                self.circuit_breaker.record_success();
                if paper.citation_count.is_none() {
                    paper.citation_count = record.citation_count;
                }
                if paper.references.is_empty() {
                    paper.references = record.references;
                }
            }
            Ok(None) => {
                self.circuit_breaker.record_success();
            }
            Err(err) => {
                self.circuit_breaker.record_failure();
                errors.push(format!("enrichment failed for {}: {err}", paper.id));
            }
        }
        paper
    }
}

/// Aggregate status surfaced to operators: §4.2's
/// `getStatus → {isRunning, lastResult, nextScheduledRun, activeSchedules[],
/// queueDepth}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceStatus {
    pub is_running: bool,
    pub last_result: Option<IngestionResult>,
    pub next_scheduled_run: Option<DateTime<Utc>>,
    pub active_schedules: Vec<JobStatus>,
    pub queue_depth: usize,
}

pub struct IngestionService {
    pipeline: Arc<Pipeline>,
    schedules: ScheduleRunner,
    last_result: Arc<Mutex<Option<IngestionResult>>>,
}

impl IngestionService {
    pub fn new(
        bibliographic: Arc<dyn BibliographicSourceClient>,
        open_access: Option<Arc<dyn OpenAccessClient>>,
        circuit_breaker: Arc<CircuitBreaker>,
        existing: Arc<dyn ExistingPapersSource>,
        sink: Arc<dyn IngestionSink>,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                bibliographic,
                open_access,
                circuit_breaker,
                existing,
                sink,
                queue_depth: Arc::new(AtomicUsize::new(0)),
            }),
            schedules: ScheduleRunner::new(),
            last_result: Arc::new(Mutex::new(None)),
        }
    }

    /// Current count of papers pending per-paper processing within the
    /// in-flight batch.
    pub fn queue_depth(&self) -> usize {
        self.pipeline.queue_depth.load(Ordering::SeqCst)
    }

    pub async fn ingest_from_arxiv(&self, options: &IngestOptions) -> IngestionResult {
        self.pipeline.ingest(options).await
    }

    pub async fn ingest_from_semantic_scholar(&self, options: &IngestOptions) -> IngestionResult {
        self.pipeline.ingest(options).await
    }

    pub async fn schedule_ingestion(&self, name: &str, cron: &str, enabled: bool) -> Result<(), IngestionError> {
        self.schedules.register(name, cron, enabled).await.map_err(|e| {
            IngestionError::Config(paperkg_core::ConfigError::InvalidValue {
                field: "cron".to_string(),
                value: cron.to_string(),
                reason: e,
            })
        })
    }

    /// Start ticking the named schedule, invoking [`Self::ingest_from_arxiv`]
    /// with `options` on every matching minute and recording its
    /// [`IngestionResult`] as [`Self::get_status`]'s `last_result`.
    pub async fn start_schedule(&self, name: &str, options: IngestOptions) -> Result<(), String> {
        let pipeline = self.pipeline.clone();
        let options = Arc::new(options);
        let last_result = self.last_result.clone();
        self.schedules
            .start(name, move || {
                let pipeline = pipeline.clone();
                let options = options.clone();
                let last_result = last_result.clone();
                Box::pin(async move {
                    let result = pipeline.ingest(&options).await;
                    *last_result.lock().await = Some(result);
                })
            })
            .await
    }

    pub async fn stop_schedule(&self, name: &str) {
        self.schedules.stop(name).await;
    }

    pub async fn remove_schedule(&self, name: &str) {
        self.schedules.remove(name).await;
    }

    pub async fn get_schedule_status(&self, name: &str) -> Option<crate::schedule::JobStatus> {
        self.schedules.status(name).await
    }

    /// Aggregate status across every registered schedule: whether any is
    /// currently ticking, the most recent scheduled [`IngestionResult`], the
    /// earliest upcoming trigger instant, every schedule's individual
    /// status, and the in-flight batch's queue depth.
    pub async fn get_status(&self) -> ServiceStatus {
        let active_schedules = self.schedules.active_schedules().await;
        let is_running = active_schedules.iter().any(|s| s.is_running);
        let next_scheduled_run = self.schedules.next_scheduled_run().await;
        let last_result = self.last_result.lock().await.clone();
        ServiceStatus { is_running, last_result, next_scheduled_run, active_schedules, queue_depth: self.queue_depth() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct FixedBibliographic {
        papers: Vec<Paper>,
    }

    #[async_trait]
    impl BibliographicSourceClient for FixedBibliographic {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<Paper>, SourceError> {
            Ok(self.papers.clone())
        }

        async fn get_by_doi(&self, _doi: &str) -> Result<Option<Paper>, SourceError> {
            Ok(None)
        }

        async fn get_by_external_id(&self, _id: &str) -> Result<Option<Paper>, SourceError> {
            Ok(None)
        }
    }

    struct EmptyExisting;

    #[async_trait]
    impl ExistingPapersSource for EmptyExisting {
        async fn snapshot(&self) -> Vec<Paper> {
            Vec::new()
        }
    }

    struct CollectingSink {
        accepted: StdMutex<Vec<Paper>>,
    }

    #[async_trait]
    impl IngestionSink for CollectingSink {
        async fn accept(&self, papers: &[Paper]) -> Result<(), String> {
            self.accepted.lock().unwrap().extend_from_slice(papers);
            Ok(())
        }
    }

    fn service(papers: Vec<Paper>) -> (IngestionService, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink { accepted: StdMutex::new(Vec::new()) });
        let service = IngestionService::new(
            Arc::new(FixedBibliographic { papers }),
            None,
            Arc::new(CircuitBreaker::new(3, Duration::from_secs(30))),
            Arc::new(EmptyExisting),
            sink.clone(),
        );
        (service, sink)
    }

    #[tokio::test]
    async fn ingest_reports_fetched_and_accepted_counts() {
        let paper = paperkg_test_utils::PaperBuilder::new("p1", "A Paper").build();
        let (service, sink) = service(vec![paper]);
        let result = service.ingest_from_arxiv(&IngestOptions { query: "llm".into(), max_results: 10 }).await;
        assert_eq!(result.total_fetched, 1);
        assert_eq!(result.new_papers.len(), 1);
        assert_eq!(result.duplicates_skipped, 0);
        assert_eq!(sink.accepted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicates_within_the_batch_are_skipped() {
        let a = paperkg_test_utils::PaperBuilder::new("p1", "A Paper").with_doi("10.1/x").build();
        let b = paperkg_test_utils::PaperBuilder::new("p2", "A Paper v2").with_doi("10.1/x").build();
        let (service, _sink) = service(vec![a, b]);
        let result = service.ingest_from_arxiv(&IngestOptions { query: "llm".into(), max_results: 10 }).await;
        assert_eq!(result.total_fetched, 2);
        assert_eq!(result.new_papers.len(), 1);
        assert_eq!(result.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn queue_depth_drains_to_zero_after_processing() {
        let paper = paperkg_test_utils::PaperBuilder::new("p1", "A Paper").build();
        let (service, _sink) = service(vec![paper]);
        service.ingest_from_arxiv(&IngestOptions { query: "llm".into(), max_results: 10 }).await;
        assert_eq!(service.queue_depth(), 0);
    }

    #[tokio::test]
    async fn status_before_any_schedule_runs_has_no_result_or_next_run() {
        let (service, _sink) = service(vec![]);
        let status = service.get_status().await;
        assert!(!status.is_running);
        assert!(status.last_result.is_none());
        assert!(status.next_scheduled_run.is_none());
        assert!(status.active_schedules.is_empty());
        assert_eq!(status.queue_depth, 0);
    }

    #[tokio::test]
    async fn starting_a_schedule_eventually_surfaces_its_result_in_get_status() {
        let paper = paperkg_test_utils::PaperBuilder::new("p1", "A Paper").build();
        let (service, _sink) = service(vec![paper]);
        service.schedule_ingestion("ingest-arxiv", "* * * * *", true).await.unwrap();
        service.start_schedule("ingest-arxiv", IngestOptions { query: "llm".into(), max_results: 10 }).await.unwrap();

        let mut status = service.get_status().await;
        for _ in 0..30 {
            if status.last_result.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            status = service.get_status().await;
        }

        assert!(status.is_running);
        let last_result = status.last_result.expect("scheduled tick should have recorded a result");
        assert_eq!(last_result.total_fetched, 1);
        assert_eq!(status.active_schedules.len(), 1);
        assert!(status.active_schedules[0].last_run.is_some());
        assert!(status.next_scheduled_run.is_some());

        service.stop_schedule("ingest-arxiv").await;
    }
}
