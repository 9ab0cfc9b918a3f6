//! CircuitBreaker port - Interface for external service resilience.
//!
//! The circuit breaker pattern stops a queue worker from hammering a
//! sidecar that is already down.
//!
//! ## States
//!
//! - **Closed**: normal operation, requests flow through
//! - **Open**: too many failures, requests rejected immediately
//! - **Half-Open**: testing whether the sidecar recovered
//!
//! ## Transitions
//!
//! ```text
//! Closed --[errors_count >= error_threshold]--> Open
//! Open --[recovery_timeout elapsed]--> Half-Open
//! Half-Open --[first success]--> Closed
//! Half-Open --[failure]--> Open
//! ```

use std::time::Duration;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests flow through to the service.
    Closed,

    /// Too many failures - requests rejected without calling the service.
    /// The circuit transitions to HalfOpen after `recovery_timeout`.
    Open,

    /// Testing whether the service recovered.
    /// Success closes the circuit, failure reopens it.
    HalfOpen,
}

impl CircuitState {
    /// Check if the circuit allows requests through.
    pub fn allows_requests(&self) -> bool {
        matches!(self, CircuitState::Closed | CircuitState::HalfOpen)
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    ///
    /// Default: 5 failures
    pub error_threshold: u32,

    /// Time to wait before testing recovery (moving to half-open).
    ///
    /// Default: 60 seconds
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            error_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

/// Port for circuit breaker functionality.
///
/// One breaker guards all calls made by a single worker instance.
///
/// # Example
///
/// ```ignore
/// if !breaker.should_allow() {
///     // leave the message unacked; the broker redelivers later
///     return;
/// }
/// match sidecar.post(&url, &payload).await {
///     Ok(()) => breaker.record_success(),
///     Err(err) if err.is_temporary() => breaker.record_failure(),
///     Err(_) => {} // permanent errors say nothing about sidecar health
/// }
/// ```
pub trait CircuitBreaker: Send + Sync {
    /// Get the current state of the circuit.
    fn state(&self) -> CircuitState;

    /// Check if a request should be allowed through.
    ///
    /// Returns `true` when the circuit is closed or half-open. An open
    /// circuit whose recovery timeout has elapsed moves to half-open and
    /// allows the probe request.
    fn should_allow(&self) -> bool;

    /// Record a successful request.
    ///
    /// Resets the failure count; in half-open state this closes the
    /// circuit.
    fn record_success(&self);

    /// Record a failed request.
    ///
    /// In closed state this counts toward the error threshold; in
    /// half-open state it immediately reopens the circuit.
    fn record_failure(&self);

    /// Force reset the circuit to closed state.
    fn reset(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn is_object_safe(_breaker: &dyn CircuitBreaker) {}

    #[test]
    fn circuit_state_allows_requests() {
        assert!(CircuitState::Closed.allows_requests());
        assert!(CircuitState::HalfOpen.allows_requests());
        assert!(!CircuitState::Open.allows_requests());
    }

    #[test]
    fn default_config_values() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.error_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(60));
    }
}
