//! Temporal analytics over citation counts: daily metrics recording with
//! adoption-phase classification, hot-topic detection, timeline retrieval
//! at day/week/month granularity, and multi-method trend forecasting with
//! ensembling.

mod error;
mod forecast;
mod hot_topics;
mod metrics;
mod repository;
mod timeline;

pub use error::TemporalError;
pub use forecast::{EnsembleForecast, Forecast, ForecastConfig, ForecastPoint, TrendForecaster};
pub use hot_topics::{hot_topics, HotTopicsQuery, HotTopicsSummary};
pub use metrics::{classify_adoption_phase, BatchMetricsReport, MetricsFailure, MetricsObservation, MetricsRecorder};
pub use repository::MetricsRepository;
pub use timeline::timeline;
