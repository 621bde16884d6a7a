//! A cron-like periodic invoker of registered jobs. Each named job runs
//! serially with itself (no overlapping invocations); distinct jobs run
//! concurrently with each other.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A minimal cron-string interpreter covering the `*/N` and fixed-value
/// forms this pipeline's schedules actually use (`"0 */6 * * *"` etc);
/// not a full cron grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSchedule {
    pub minute: CronField,
    pub hour: CronField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronField {
    Every(u32),
    At(u32),
    Any,
}

impl CronSchedule {
    /// Parse a 5-field cron string, using only the minute and hour fields
    /// (day-of-month/month/day-of-week are accepted but ignored, matching
    /// the ingestion schedules this runner actually serves).
    pub fn parse(expr: &str) -> Option<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return None;
        }
        Some(Self { minute: parse_field(fields[0])?, hour: parse_field(fields[1])? })
    }

    /// Whether `now` is a trigger instant for this schedule.
    pub fn matches(&self, now: &DateTime<Utc>) -> bool {
        use chrono::Timelike;
        field_matches(self.minute, now.minute()) && field_matches(self.hour, now.hour())
    }

    /// The next whole-minute instant strictly after `from` at which this
    /// schedule matches. Scans forward minute-by-minute; since only the
    /// minute/hour fields are interpreted (day-of-month/month/day-of-week are
    /// ignored, see [`Self::parse`]), a match is always found within 24h.
    pub fn next_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        use chrono::{Duration, Timelike};
        let mut candidate = from.with_second(0).and_then(|d| d.with_nanosecond(0)).unwrap_or(from) + Duration::minutes(1);
        for _ in 0..=(24 * 60) {
            if self.matches(&candidate) {
                return candidate;
            }
            candidate += Duration::minutes(1);
        }
        candidate
    }
}

fn parse_field(s: &str) -> Option<CronField> {
    if s == "*" {
        Some(CronField::Any)
    } else if let Some(n) = s.strip_prefix("*/") {
        n.parse().ok().map(CronField::Every)
    } else {
        s.parse().ok().map(CronField::At)
    }
}

fn field_matches(field: CronField, value: u32) -> bool {
    match field {
        CronField::Any => true,
        CronField::At(n) => n == value,
        CronField::Every(n) => n != 0 && value % n == 0,
    }
}

struct JobState {
    cron: CronSchedule,
    enabled: bool,
    running: Arc<Mutex<()>>,
    handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    last_run: Option<DateTime<Utc>>,
}

/// Registers and drives named periodic jobs. A job's body is an
/// `Fn() -> JobFuture` so the same registration can be invoked repeatedly
/// without the runner owning the closure's captured state by value.
pub struct ScheduleRunner {
    jobs: Arc<Mutex<HashMap<String, JobState>>>,
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self { jobs: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Register a job under `name`. It does not start ticking until
    /// [`Self::start`] is called for that name.
    pub async fn register(&self, name: impl Into<String>, cron: &str, enabled: bool) -> Result<(), String> {
        let cron = CronSchedule::parse(cron).ok_or_else(|| format!("invalid cron expression: {cron}"))?;
        let mut jobs = self.jobs.lock().await;
        jobs.insert(
            name.into(),
            JobState { cron, enabled, running: Arc::new(Mutex::new(())), handle: None, cancel: CancellationToken::new(), last_run: None },
        );
        Ok(())
    }

    pub async fn remove(&self, name: &str) {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.remove(name) {
            job.cancel.cancel();
            if let Some(handle) = job.handle {
                handle.abort();
            }
        }
    }

    /// Spawn the tick loop for `name`, invoking `body` once per matching
    /// minute. `body` is never invoked concurrently with itself: if the
    /// previous invocation is still running when the next tick arrives,
    /// that tick is skipped.
    pub async fn start<F>(&self, name: &str, body: F) -> Result<(), String>
    where
        F: Fn() -> JobFuture + Send + Sync + 'static,
    {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(name).ok_or_else(|| format!("no such schedule: {name}"))?;
        if job.handle.is_some() {
            return Ok(());
        }
        job.enabled = true;
        let cron = job.cron;
        let running = job.running.clone();
        let cancel = job.cancel.clone();
        let jobs_map_key = name.to_string();
        let jobs_map = self.jobs.clone();

        let handle = tokio::spawn(async move {
            let mut last_minute = None;
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let now = Utc::now();
                let minute_bucket = now.timestamp() / 60;
                if cron.matches(&now) && last_minute != Some(minute_bucket) {
                    last_minute = Some(minute_bucket);
                    if let Ok(guard) = running.try_lock() {
                        drop(guard);
                        let _permit = running.lock().await;
                        tracing::debug!(job = %jobs_map_key, "schedule tick firing");
                        body().await;
                        Self::record_run_in(&jobs_map, &jobs_map_key, Utc::now()).await;
                    } else {
                        tracing::warn!(job = %jobs_map_key, "schedule tick skipped: previous run still in flight");
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
                    _ = cancel.cancelled() => break,
                }
            }
        });

        job.handle = Some(handle);
        Ok(())
    }

    pub async fn stop(&self, name: &str) {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(name) {
            job.cancel.cancel();
            if let Some(handle) = job.handle.take() {
                handle.abort();
            }
            job.enabled = false;
            job.cancel = CancellationToken::new();
        }
    }

    /// Record that `name` fired at `at`. Called automatically by the tick
    /// loop after each invocation of its body; exposed for callers (tests,
    /// or a manually-driven job) that invoke a schedule's work outside of
    /// [`Self::start`]'s own loop.
    pub async fn record_run(&self, name: &str, at: DateTime<Utc>) {
        Self::record_run_in(&self.jobs, name, at).await;
    }

    async fn record_run_in(jobs: &Mutex<HashMap<String, JobState>>, name: &str, at: DateTime<Utc>) {
        if let Some(job) = jobs.lock().await.get_mut(name) {
            job.last_run = Some(at);
        }
    }

    pub async fn status(&self, name: &str) -> Option<JobStatus> {
        let jobs = self.jobs.lock().await;
        let job = jobs.get(name)?;
        Some(JobStatus { name: name.to_string(), enabled: job.enabled, is_running: job.handle.is_some(), last_run: job.last_run })
    }

    /// Status of every registered schedule, in arbitrary (map) order.
    pub async fn active_schedules(&self) -> Vec<JobStatus> {
        let jobs = self.jobs.lock().await;
        jobs.iter()
            .map(|(name, job)| JobStatus { name: name.clone(), enabled: job.enabled, is_running: job.handle.is_some(), last_run: job.last_run })
            .collect()
    }

    /// The earliest next trigger instant across every enabled schedule, or
    /// `None` if none are enabled.
    pub async fn next_scheduled_run(&self) -> Option<DateTime<Utc>> {
        let jobs = self.jobs.lock().await;
        let now = Utc::now();
        jobs.values().filter(|job| job.enabled).map(|job| job.cron.next_after(now)).min()
    }
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub name: String,
    pub enabled: bool,
    pub is_running: bool,
    pub last_run: Option<DateTime<Utc>>,
}
