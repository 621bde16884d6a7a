//! Top-level configuration, loaded from environment variables with
//! documented defaults for every knob the core subsystems expose.

use std::time::Duration;

/// Process-wide configuration for the rate limiter, retry backoff, caches,
/// and the default ingestion schedule.
#[derive(Debug, Clone)]
pub struct PaperKgConfig {
    // ========================================================================
    // Rate limiter (shared by every source client)
    // ========================================================================
    pub rate_limiter_max_tokens: f64,
    pub rate_limiter_refill_rate: f64,

    // ========================================================================
    // Retry backoff (transaction manager)
    // ========================================================================
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,

    // ========================================================================
    // Caches
    // ========================================================================
    pub alias_cache_max_size: usize,
    pub alias_cache_ttl: Duration,
    pub schema_cache_ttl: Duration,
    pub path_cache_max_size: usize,
    pub path_cache_ttl: Duration,

    // ========================================================================
    // Ingestion
    // ========================================================================
    pub bibliographic_base_url: String,
    pub open_access_base_url: String,
    pub open_access_contact_email: String,
    pub default_query: String,
    pub default_max_results: usize,
    pub ingestion_schedule_cron: String,
    pub ingestion_schedule_enabled: bool,

    // ========================================================================
    // Circuit breaker (wraps the open-access client)
    // ========================================================================
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_reset_after: Duration,
}

impl Default for PaperKgConfig {
    fn default() -> Self {
        Self {
            rate_limiter_max_tokens: 1.0,
            rate_limiter_refill_rate: 1.0 / 3.0,

            retry_max_attempts: 4,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(5),

            alias_cache_max_size: 10_000,
            alias_cache_ttl: Duration::from_secs(30 * 60),
            schema_cache_ttl: Duration::from_secs(5 * 60),
            path_cache_max_size: 500,
            path_cache_ttl: Duration::from_secs(10 * 60),

            bibliographic_base_url: "https://export.arxiv.org/api".to_string(),
            open_access_base_url: "https://api.unpaywall.org/v2".to_string(),
            open_access_contact_email: "paperkg@example.com".to_string(),
            default_query: "large language models".to_string(),
            default_max_results: 50,
            ingestion_schedule_cron: "*/15 * * * *".to_string(),
            ingestion_schedule_enabled: false,

            circuit_breaker_threshold: 3,
            circuit_breaker_reset_after: Duration::from_secs(30),
        }
    }
}

impl PaperKgConfig {
    /// Build configuration from environment variables, falling back to
    /// [`Default`] for anything unset or unparseable.
    ///
    /// Environment variables:
    /// - `PAPERKG_RATE_LIMITER_MAX_TOKENS` (default: 1.0)
    /// - `PAPERKG_RATE_LIMITER_REFILL_RATE` (default: 0.333, i.e. one token per 3s)
    /// - `PAPERKG_RETRY_MAX_ATTEMPTS` (default: 4)
    /// - `PAPERKG_RETRY_BASE_DELAY_MS` (default: 100)
    /// - `PAPERKG_RETRY_MAX_DELAY_MS` (default: 5000)
    /// - `PAPERKG_ALIAS_CACHE_MAX_SIZE` (default: 10000)
    /// - `PAPERKG_ALIAS_CACHE_TTL_SECS` (default: 1800)
    /// - `PAPERKG_SCHEMA_CACHE_TTL_SECS` (default: 300)
    /// - `PAPERKG_PATH_CACHE_MAX_SIZE` (default: 500)
    /// - `PAPERKG_PATH_CACHE_TTL_SECS` (default: 600)
    /// - `PAPERKG_BIBLIOGRAPHIC_BASE_URL`
    /// - `PAPERKG_OPEN_ACCESS_BASE_URL`
    /// - `PAPERKG_OPEN_ACCESS_CONTACT_EMAIL`
    /// - `PAPERKG_DEFAULT_QUERY`
    /// - `PAPERKG_DEFAULT_MAX_RESULTS` (default: 50)
    /// - `PAPERKG_INGESTION_SCHEDULE_CRON` (default: "*/15 * * * *")
    /// - `PAPERKG_INGESTION_SCHEDULE_ENABLED` (default: false)
    /// - `PAPERKG_CIRCUIT_BREAKER_THRESHOLD` (default: 3)
    /// - `PAPERKG_CIRCUIT_BREAKER_RESET_AFTER_SECS` (default: 30)
    pub fn from_env() -> Self {
        let default = Self::default();

        let env_f64 = |key: &str, fallback: f64| -> f64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(fallback)
        };
        let env_u32 = |key: &str, fallback: u32| -> u32 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(fallback)
        };
        let env_usize = |key: &str, fallback: usize| -> usize {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(fallback)
        };
        let env_secs = |key: &str, fallback: Duration| -> Duration {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).map(Duration::from_secs).unwrap_or(fallback)
        };
        let env_millis = |key: &str, fallback: Duration| -> Duration {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).map(Duration::from_millis).unwrap_or(fallback)
        };
        let env_string = |key: &str, fallback: &str| -> String { std::env::var(key).unwrap_or_else(|_| fallback.to_string()) };
        let env_bool = |key: &str, fallback: bool| -> bool {
            std::env::var(key).ok().map(|v| v.to_lowercase() == "true").unwrap_or(fallback)
        };

        Self {
            rate_limiter_max_tokens: env_f64("PAPERKG_RATE_LIMITER_MAX_TOKENS", default.rate_limiter_max_tokens),
            rate_limiter_refill_rate: env_f64("PAPERKG_RATE_LIMITER_REFILL_RATE", default.rate_limiter_refill_rate),

            retry_max_attempts: env_u32("PAPERKG_RETRY_MAX_ATTEMPTS", default.retry_max_attempts),
            retry_base_delay: env_millis("PAPERKG_RETRY_BASE_DELAY_MS", default.retry_base_delay),
            retry_max_delay: env_millis("PAPERKG_RETRY_MAX_DELAY_MS", default.retry_max_delay),

            alias_cache_max_size: env_usize("PAPERKG_ALIAS_CACHE_MAX_SIZE", default.alias_cache_max_size),
            alias_cache_ttl: env_secs("PAPERKG_ALIAS_CACHE_TTL_SECS", default.alias_cache_ttl),
            schema_cache_ttl: env_secs("PAPERKG_SCHEMA_CACHE_TTL_SECS", default.schema_cache_ttl),
            path_cache_max_size: env_usize("PAPERKG_PATH_CACHE_MAX_SIZE", default.path_cache_max_size),
            path_cache_ttl: env_secs("PAPERKG_PATH_CACHE_TTL_SECS", default.path_cache_ttl),

            bibliographic_base_url: env_string("PAPERKG_BIBLIOGRAPHIC_BASE_URL", &default.bibliographic_base_url),
            open_access_base_url: env_string("PAPERKG_OPEN_ACCESS_BASE_URL", &default.open_access_base_url),
            open_access_contact_email: env_string("PAPERKG_OPEN_ACCESS_CONTACT_EMAIL", &default.open_access_contact_email),
            default_query: env_string("PAPERKG_DEFAULT_QUERY", &default.default_query),
            default_max_results: env_usize("PAPERKG_DEFAULT_MAX_RESULTS", default.default_max_results),
            ingestion_schedule_cron: env_string("PAPERKG_INGESTION_SCHEDULE_CRON", &default.ingestion_schedule_cron),
            ingestion_schedule_enabled: env_bool("PAPERKG_INGESTION_SCHEDULE_ENABLED", default.ingestion_schedule_enabled),

            circuit_breaker_threshold: env_u32("PAPERKG_CIRCUIT_BREAKER_THRESHOLD", default.circuit_breaker_threshold),
            circuit_breaker_reset_after: env_secs(
                "PAPERKG_CIRCUIT_BREAKER_RESET_AFTER_SECS",
                default.circuit_breaker_reset_after,
            ),
        }
    }
}
