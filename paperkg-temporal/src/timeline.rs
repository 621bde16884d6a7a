//! Timeline retrieval at day/week/month granularity. Day reads the raw
//! series; week and month delegate to store-side aggregation rather than
//! resampling client-side.

use crate::error::TemporalError;
use crate::repository::MetricsRepository;
use chrono::{DateTime, Utc};
use paperkg_core::{DailyMetrics, GraphEntityId, TimelineGranularity};

pub async fn timeline(
    repository: &dyn MetricsRepository,
    entity_id: &GraphEntityId,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    granularity: TimelineGranularity,
) -> Result<Vec<DailyMetrics>, TemporalError> {
    match granularity {
        TimelineGranularity::Day => repository.series(entity_id, since, until).await,
        TimelineGranularity::Week => repository.weekly_aggregate(entity_id, since, until).await,
        TimelineGranularity::Month => repository.monthly_aggregate(entity_id, since, until).await,
    }
}
