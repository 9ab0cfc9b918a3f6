//! Resilience adapters.

mod counting_breaker;

pub use counting_breaker::CountingCircuitBreaker;
