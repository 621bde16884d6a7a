//! Daily metrics recording: velocity/momentum computation, adoption-phase
//! classification, and batch recording.

use crate::error::TemporalError;
use crate::repository::MetricsRepository;
use chrono::{DateTime, Utc};
use paperkg_core::{AdoptionPhase, DailyMetrics, GraphEntityId};
use std::sync::Arc;

/// One item in a batch-recording request.
#[derive(Debug, Clone)]
pub struct MetricsObservation {
    pub entity_id: GraphEntityId,
    pub date: DateTime<Utc>,
    pub citation_count: u64,
    pub months_since_publication: f64,
}

#[derive(Debug, Clone)]
pub struct MetricsFailure {
    pub entity_id: GraphEntityId,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchMetricsReport {
    pub recorded: Vec<DailyMetrics>,
    pub failed: Vec<MetricsFailure>,
}

impl BatchMetricsReport {
    pub fn recorded_count(&self) -> usize {
        self.recorded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// `velocity = citationCount - previous.citationCount` (per day);
/// `momentum` is the percent change over the previous count, `0` when
/// there is no prior record or the prior count was zero.
fn velocity_and_momentum(citation_count: u64, previous: Option<&DailyMetrics>) -> (f64, f64) {
    match previous {
        Some(prev) => {
            let delta = citation_count as f64 - prev.citation_count as f64;
            let momentum = if prev.citation_count > 0 { delta / prev.citation_count as f64 * 100.0 } else { 0.0 };
            (delta, momentum)
        }
        None => (0.0, 0.0),
    }
}

/// Deterministic phase classifier over `(momentum, velocity, citationCount,
/// monthsSincePublication)`. Thresholds are fixed constants here; swap this
/// function out for a different classifier without touching the recorder.
pub fn classify_adoption_phase(
    momentum: f64,
    velocity: f64,
    citation_count: u64,
    months_since_publication: f64,
) -> AdoptionPhase {
    if citation_count == 0 {
        return AdoptionPhase::Emerging;
    }
    if months_since_publication <= 6.0 && momentum >= 20.0 {
        return AdoptionPhase::Emerging;
    }
    if momentum >= 10.0 && velocity > 0.0 {
        return AdoptionPhase::Growing;
    }
    if momentum <= -15.0 || velocity < 0.0 {
        return AdoptionPhase::Declining;
    }
    AdoptionPhase::Mature
}

pub struct MetricsRecorder {
    repository: Arc<dyn MetricsRepository>,
}

impl MetricsRecorder {
    pub fn new(repository: Arc<dyn MetricsRepository>) -> Self {
        Self { repository }
    }

    /// Compute and persist one day's record for `entity_id`.
    pub async fn record(&self, observation: MetricsObservation) -> Result<DailyMetrics, TemporalError> {
        let metrics = self.compute(&observation).await?;
        self.repository.upsert(&metrics).await?;
        Ok(metrics)
    }

    async fn compute(&self, observation: &MetricsObservation) -> Result<DailyMetrics, TemporalError> {
        let previous = self.repository.latest_before(&observation.entity_id, observation.date).await?;
        let (velocity, momentum) = velocity_and_momentum(observation.citation_count, previous.as_ref());
        let adoption_phase =
            classify_adoption_phase(momentum, velocity, observation.citation_count, observation.months_since_publication);
        Ok(DailyMetrics {
            entity_id: observation.entity_id.clone(),
            date: observation.date,
            citation_count: observation.citation_count,
            velocity,
            momentum,
            adoption_phase,
            rank: None,
        })
    }

    /// Compute every observation independently, collecting per-entity
    /// failures, then flush all successes in a single store batch.
    pub async fn record_batch(&self, observations: Vec<MetricsObservation>) -> BatchMetricsReport {
        let mut report = BatchMetricsReport::default();
        for observation in observations {
            let entity_id = observation.entity_id.clone();
            match self.compute(&observation).await {
                Ok(metrics) => report.recorded.push(metrics),
                Err(err) => report.failed.push(MetricsFailure { entity_id, error: err.to_string() }),
            }
        }
        if !report.recorded.is_empty() {
            if let Err(err) = self.repository.upsert_many(&report.recorded).await {
                let failed_entities: Vec<MetricsFailure> = report
                    .recorded
                    .iter()
                    .map(|m| MetricsFailure { entity_id: m.entity_id.clone(), error: err.to_string() })
                    .collect();
                report.failed.extend(failed_entities);
                report.recorded.clear();
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_prior_record_yields_zero_velocity_and_momentum() {
        let (velocity, momentum) = velocity_and_momentum(10, None);
        assert_eq!(velocity, 0.0);
        assert_eq!(momentum, 0.0);
    }

    #[test]
    fn momentum_is_percent_change_over_previous_count() {
        let prev = DailyMetrics {
            entity_id: GraphEntityId::new("e1"),
            date: Utc::now(),
            citation_count: 100,
            velocity: 0.0,
            momentum: 0.0,
            adoption_phase: AdoptionPhase::Growing,
            rank: None,
        };
        let (velocity, momentum) = velocity_and_momentum(120, Some(&prev));
        assert_eq!(velocity, 20.0);
        assert_eq!(momentum, 20.0);
    }

    #[test]
    fn zero_citations_classifies_as_emerging() {
        assert_eq!(classify_adoption_phase(0.0, 0.0, 0, 1.0), AdoptionPhase::Emerging);
    }

    #[test]
    fn high_early_momentum_classifies_as_emerging() {
        assert_eq!(classify_adoption_phase(25.0, 5.0, 10, 2.0), AdoptionPhase::Emerging);
    }

    #[test]
    fn sustained_growth_classifies_as_growing() {
        assert_eq!(classify_adoption_phase(12.0, 3.0, 50, 18.0), AdoptionPhase::Growing);
    }

    #[test]
    fn shrinking_counts_classify_as_declining() {
        assert_eq!(classify_adoption_phase(-20.0, -5.0, 200, 36.0), AdoptionPhase::Declining);
    }

    #[test]
    fn flat_counts_classify_as_mature() {
        assert_eq!(classify_adoption_phase(1.0, 0.0, 500, 48.0), AdoptionPhase::Mature);
    }
}
