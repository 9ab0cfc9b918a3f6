//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Unsupported JWT algorithm")]
    UnsupportedJwtAlgorithm,

    #[error("Invalid sidecar URL format: {0}")]
    InvalidSidecarUrl(&'static str),

    #[error("Scheduler interval must be positive")]
    InvalidSchedulerInterval,
}
