//! Structured logging setup: an `EnvFilter` + JSON formatter pair, the same
//! shape as the API server's telemetry module minus the OpenTelemetry
//! exporter (distributed tracing has no home in a one-shot CLI).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("PAPERKG_SERVICE_NAME").unwrap_or_else(|_| "paperkg-cli".to_string()),
            environment: std::env::var("PAPERKG_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }
}

/// Install the global `tracing` subscriber. Must be called exactly once,
/// before any other module emits a span or event.
pub fn init_tracing(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paperkg=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .ok();

    tracing::info!(service_name = %config.service_name, environment = %config.environment, "telemetry initialized");
}
