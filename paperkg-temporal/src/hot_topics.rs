//! Hot-topic detection: entities whose momentum has crossed a threshold.

use crate::error::TemporalError;
use crate::repository::MetricsRepository;
use paperkg_core::DailyMetrics;

#[derive(Debug, Clone, Copy)]
pub struct HotTopicsQuery {
    pub limit: usize,
    pub min_momentum: f64,
}

#[derive(Debug, Clone)]
pub struct HotTopicsSummary {
    pub topics: Vec<DailyMetrics>,
    pub total_emerging: usize,
    pub avg_momentum: f64,
}

/// `totalEmerging` counts topics whose momentum exceeds `1.5 *
/// min_momentum` — a stricter bar than the query threshold itself, so the
/// summary can distinguish "hot" from "on fire".
pub async fn hot_topics(
    repository: &dyn MetricsRepository,
    query: HotTopicsQuery,
) -> Result<HotTopicsSummary, TemporalError> {
    let topics = repository.hot_topics(query.limit, query.min_momentum).await?;
    let total_emerging = topics.iter().filter(|m| m.momentum > 1.5 * query.min_momentum).count();
    let avg_momentum =
        if topics.is_empty() { 0.0 } else { topics.iter().map(|m| m.momentum).sum::<f64>() / topics.len() as f64 };
    Ok(HotTopicsSummary { topics, total_emerging, avg_momentum })
}
