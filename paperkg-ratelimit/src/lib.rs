//! Token-bucket rate limiter.
//!
//! Shared by every external client (source clients, LLM providers). State is
//! a single `Mutex`-protected bucket so that refill-then-check is atomic
//! under concurrent callers.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Error returned when `acquire` is cancelled before enough tokens became
/// available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rate limiter acquire cancelled")
    }
}

impl std::error::Error for Cancelled {}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A token-bucket rate limiter.
///
/// `tokens` is tracked as a floating-point quantity that refills continuously
/// at `refill_rate` tokens/second up to `max_tokens`. `last_refill` never
/// drifts forward past "now": each refill advances it by exactly the
/// elapsed wall-clock time it just accounted for.
pub struct TokenBucketRateLimiter {
    state: Mutex<BucketState>,
    max_tokens: f64,
    refill_rate: f64,
}

impl TokenBucketRateLimiter {
    /// Construct a limiter starting at full capacity.
    pub fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
            max_tokens,
            refill_rate,
        }
    }

    /// The preconfigured bibliographic-source limiter: 1 token / 3 seconds,
    /// burst 1, approximating a conservative source policy.
    pub fn bibliographic_default() -> Self {
        Self::new(1.0, 1.0 / 3.0)
    }

    /// Refill under the lock and return the post-refill token count. Callers
    /// hold the lock for the duration of this call only; no awaiting happens
    /// while held.
    fn refill_locked(state: &mut BucketState, max_tokens: f64, refill_rate: f64) {
        let now = Instant::now();
        if now > state.last_refill {
            let elapsed = now.duration_since(state.last_refill).as_secs_f64();
            state.tokens = (state.tokens + elapsed * refill_rate).min(max_tokens);
            state.last_refill = now;
        }
    }

    /// Attempt to acquire `n` tokens without blocking.
    pub fn try_acquire(&self, n: f64) -> bool {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");
        Self::refill_locked(&mut state, self.max_tokens, self.refill_rate);
        if state.tokens >= n {
            state.tokens -= n;
            true
        } else {
            false
        }
    }

    /// The time a caller would currently have to wait before `n` tokens are
    /// available; zero when tokens are already available.
    pub fn wait_time(&self, n: f64) -> Duration {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");
        Self::refill_locked(&mut state, self.max_tokens, self.refill_rate);
        if state.tokens >= n {
            Duration::ZERO
        } else {
            let deficit = n - state.tokens;
            Duration::from_secs_f64(deficit / self.refill_rate)
        }
    }

    /// Block (asynchronously) until `n` tokens are available, then consume
    /// them.
    pub async fn acquire(&self, n: f64) {
        loop {
            let wait = {
                let mut state = self.state.lock().expect("rate limiter mutex poisoned");
                Self::refill_locked(&mut state, self.max_tokens, self.refill_rate);
                if state.tokens >= n {
                    state.tokens -= n;
                    return;
                }
                (n - state.tokens) / self.refill_rate
            };
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        }
    }

    /// As `acquire`, but aborts the pending sleep if `cancel` fires.
    pub async fn acquire_cancellable(
        &self,
        n: f64,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let wait = {
                let mut state = self.state.lock().expect("rate limiter mutex poisoned");
                Self::refill_locked(&mut state, self.max_tokens, self.refill_rate);
                if state.tokens >= n {
                    state.tokens -= n;
                    return Ok(());
                }
                (n - state.tokens) / self.refill_rate
            };
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs_f64(wait)) => {}
                _ = cancel.cancelled() => return Err(Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_succeeds_second_fails_immediately() {
        let limiter = TokenBucketRateLimiter::new(1.0, 1.0 / 3.0);
        assert!(limiter.try_acquire(1.0));
        assert!(!limiter.try_acquire(1.0));
    }

    #[test]
    fn wait_time_is_zero_when_tokens_available() {
        let limiter = TokenBucketRateLimiter::new(5.0, 1.0);
        assert_eq!(limiter.wait_time(1.0), Duration::ZERO);
    }

    #[test]
    fn wait_time_is_positive_after_exhausting_bucket() {
        let limiter = TokenBucketRateLimiter::new(1.0, 1.0 / 3.0);
        assert!(limiter.try_acquire(1.0));
        let wait = limiter.wait_time(1.0);
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_completes_after_refill() {
        let limiter = TokenBucketRateLimiter::new(1.0, 1.0 / 3.0);
        assert!(limiter.try_acquire(1.0));
        let start = Instant::now();
        limiter.acquire(1.0).await;
        assert!(start.elapsed() >= Duration::from_secs(3) - Duration::from_millis(50));
    }

    #[tokio::test]
    async fn acquire_cancellable_returns_err_when_cancelled() {
        let limiter = TokenBucketRateLimiter::new(1.0, 1.0 / 3600.0);
        assert!(limiter.try_acquire(1.0));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = limiter.acquire_cancellable(1.0, &cancel).await;
        assert!(result.is_err());
    }

    #[test]
    fn refill_never_exceeds_max_tokens() {
        let limiter = TokenBucketRateLimiter::new(2.0, 10.0);
        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.wait_time(2.0) == Duration::ZERO);
        assert!(limiter.try_acquire(2.0));
        assert!(!limiter.try_acquire(0.01));
    }
}
