//! Classic three-state circuit breaker, wrapping the open-access client so
//! a flaky dependency can't stall every enrichment call behind a long
//! per-request timeout.

use paperkg_core::CircuitState;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct State {
    status: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Opens after `threshold` consecutive failures; after `reset_after` has
/// elapsed it allows exactly one half-open trial. A trial success closes
/// the breaker and resets the failure count; a trial failure re-opens it
/// and restarts the cooldown.
pub struct CircuitBreaker {
    state: Mutex<State>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, reset_after: Duration) -> Self {
        Self {
            state: Mutex::new(State { status: CircuitState::Closed, consecutive_failures: 0, opened_at: None }),
            threshold,
            reset_after,
        }
    }

    /// Whether a call may currently be attempted. `Open` transitions itself
    /// to `HalfOpen` once the cooldown has elapsed, allowing exactly the
    /// next caller through as a trial.
    pub fn is_available(&self) -> bool {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        match state.status {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = state.opened_at.map(|t| t.elapsed()).unwrap_or(Duration::ZERO);
                if elapsed >= self.reset_after {
                    state.status = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().expect("circuit breaker mutex poisoned").status
    }

    /// Record a successful call: closes the breaker and clears the failure
    /// streak, whether this was a normal call or the half-open trial.
    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        state.status = CircuitState::Closed;
        state.consecutive_failures = 0;
        state.opened_at = None;
    }

    /// Record a failed call. A failure during the half-open trial re-opens
    /// immediately; otherwise the breaker opens once `threshold`
    /// consecutive failures have accumulated.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        match state.status {
            CircuitState::HalfOpen => {
                state.status = CircuitState::Open;
                state.opened_at = Some(Instant::now());
            }
            CircuitState::Closed | CircuitState::Open => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.threshold {
                    state.status = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(breaker.is_available());
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.is_available());
    }

    #[test]
    fn success_resets_failure_streak() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_trial_success_closes_the_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(5));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.is_available());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_trial_failure_reopens_and_restarts_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(5));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.is_available());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.is_available());
    }
}
