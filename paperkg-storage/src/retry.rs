//! A single retry helper shared by every caller that needs to ride out
//! transient store errors, rather than each caller hand-rolling its own
//! backoff loop.

use paperkg_core::Retryable;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, i.e. `max_retries + 1`: one initial try plus up to
    /// `max_retries` retries.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// `max_retries=3`, `initial_delay=100ms`, `max_delay=5s`,
    /// `backoff_multiplier=2` — the documented defaults.
    fn default() -> Self {
        Self { max_attempts: 4, base_delay: Duration::from_millis(100), max_delay: Duration::from_secs(5) }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        scaled.min(self.max_delay)
    }
}

/// Run `op` up to `policy.max_attempts` times, retrying only while the
/// returned error reports itself as retryable and attempts remain.
/// Non-retryable errors and exhausted attempts both return immediately.
pub async fn execute_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.is_retryable() || attempt >= policy.max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(policy.delay_for(attempt - 1)).await;
            }
        }
    }
}
