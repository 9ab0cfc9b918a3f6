//! Error-count circuit breaker.

use std::sync::Mutex;
use std::time::Instant;

use crate::ports::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

/// Thread-safe breaker counting consecutive failures.
///
/// Closed until `error_threshold` consecutive failures, then open for
/// `recovery_timeout`. The first `should_allow` after the timeout half-opens
/// the circuit; a success closes it again, a failure reopens it.
pub struct CountingCircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

struct BreakerInner {
    state: CircuitState,
    errors_count: u32,
    opened_at: Option<Instant>,
}

impl CountingCircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                errors_count: 0,
                opened_at: None,
            }),
        }
    }
}

impl Default for CountingCircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker for CountingCircuitBreaker {
    fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    fn should_allow(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();

        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.recovery_timeout)
                    .unwrap_or(false);
                if recovered {
                    inner.state = CircuitState::HalfOpen;
                    tracing::warn!("circuit breaker half-open, probing");
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.errors_count = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.opened_at = None;
            tracing::warn!("circuit breaker closed");
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                tracing::error!("circuit breaker reopened after failed probe");
            }
            CircuitState::Closed => {
                inner.errors_count += 1;
                if inner.errors_count >= self.config.error_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    tracing::error!(
                        errors = inner.errors_count,
                        "circuit breaker opened"
                    );
                }
            }
            CircuitState::Open => {}
        }
    }

    fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = CircuitState::Closed;
        inner.errors_count = 0;
        inner.opened_at = None;
    }
}
