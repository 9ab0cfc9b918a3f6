//! SidecarClient port - outbound POSTs from queue workers.
//!
//! Workers deliver events to HTTP sidecars (auth service, notification
//! service). The port classifies every failure so the consumer loop knows
//! whether to dead-letter or requeue a message.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while processing a queued message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The sidecar rejected the request (4xx) or the message is malformed.
    /// Retrying cannot help; the message goes to the DLQ.
    #[error("permanent worker error: {0}")]
    Permanent(String),

    /// The sidecar or network failed (5xx, timeout, connect error).
    /// The message is requeued and the failure counts toward the breaker.
    #[error("temporary worker error: {0}")]
    Temporary(String),
}

impl WorkerError {
    /// Whether this failure should requeue the message.
    pub fn is_temporary(&self) -> bool {
        matches!(self, WorkerError::Temporary(_))
    }
}

/// Port for delivering a JSON payload to a sidecar endpoint.
///
/// Implementations map responses onto the worker error taxonomy:
/// 2xx → `Ok`, 4xx → `Permanent`, 5xx and transport failures → `Temporary`.
#[async_trait]
pub trait SidecarClient: Send + Sync {
    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<(), WorkerError>;
}
