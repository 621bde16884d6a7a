//! Persistence seam for daily metrics and trend snapshots. Kept separate
//! from the recording/forecasting logic so any store (the graph store
//! under its own label, a relational table, an in-memory fixture) can
//! serve as the source of truth.

use crate::error::TemporalError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperkg_core::{DailyMetrics, GraphEntityId, TrendSnapshot};

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// The most recent record for `entity_id` strictly before `before`, if
    /// any — the "previous" point velocity and momentum are computed
    /// against.
    async fn latest_before(
        &self,
        entity_id: &GraphEntityId,
        before: DateTime<Utc>,
    ) -> Result<Option<DailyMetrics>, TemporalError>;

    async fn upsert(&self, metrics: &DailyMetrics) -> Result<(), TemporalError>;

    /// Flush a whole batch of already-computed records in one store call.
    async fn upsert_many(&self, metrics: &[DailyMetrics]) -> Result<(), TemporalError>;

    /// Raw day-granularity series for `entity_id` within `[since, until]`,
    /// ascending by date.
    async fn series(
        &self,
        entity_id: &GraphEntityId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<DailyMetrics>, TemporalError>;

    /// Store-side week aggregation (one record per ISO week).
    async fn weekly_aggregate(
        &self,
        entity_id: &GraphEntityId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<DailyMetrics>, TemporalError>;

    /// Store-side month aggregation (one record per calendar month).
    async fn monthly_aggregate(
        &self,
        entity_id: &GraphEntityId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<DailyMetrics>, TemporalError>;

    /// Entities whose latest recorded momentum exceeds `min_momentum`,
    /// most-momentum-first, up to `limit`.
    async fn hot_topics(&self, limit: usize, min_momentum: f64) -> Result<Vec<DailyMetrics>, TemporalError>;

    async fn record_snapshot(&self, snapshot: &TrendSnapshot) -> Result<(), TemporalError>;
}
