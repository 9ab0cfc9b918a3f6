//! Queue-worker framework.
//!
//! A worker consumes one queue and delivers each event to an HTTP sidecar.
//! The framework classifies every message into a broker decision:
//!
//! 1. Circuit breaker open → message skipped (left unacked; the broker
//!    redelivers it after the channel closes)
//! 2. Invalid JSON → reject without requeue → dead-letter queue
//! 3. Permanent error (sidecar 4xx, malformed event) → reject → DLQ
//! 4. Temporary error (sidecar 5xx, network) → breaker failure + requeue
//! 5. Success → breaker success + ack

use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::{CircuitBreaker, WorkerError};

/// A consumer of one queue.
#[async_trait]
pub trait QueueWorker: Send + Sync {
    /// Queue this worker consumes.
    fn queue_name(&self) -> &str;

    /// Deliver one decoded event to the sidecar.
    async fn handle_event(&self, payload: serde_json::Value) -> Result<(), WorkerError>;
}

/// Broker decision for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Processed successfully; acknowledge.
    Ack,

    /// Unprocessable; reject without requeue so it dead-letters.
    Reject,

    /// Transient failure; return to the queue for another attempt.
    NackRequeue,

    /// Breaker open; not dispatched and left unacknowledged.
    Skipped,
}

/// Applies the processing algorithm around a worker.
pub struct WorkerProcessor {
    worker: Arc<dyn QueueWorker>,
    breaker: Arc<dyn CircuitBreaker>,
}

impl WorkerProcessor {
    pub fn new(worker: Arc<dyn QueueWorker>, breaker: Arc<dyn CircuitBreaker>) -> Self {
        Self { worker, breaker }
    }

    /// Queue the wrapped worker consumes.
    pub fn queue_name(&self) -> &str {
        self.worker.queue_name()
    }

    /// Process one raw message body into a broker decision.
    pub async fn process(&self, body: &[u8]) -> MessageOutcome {
        let queue = self.worker.queue_name();

        if !self.breaker.should_allow() {
            tracing::warn!(queue, "circuit breaker open, message not dispatched");
            return MessageOutcome::Skipped;
        }

        let payload: serde_json::Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(queue, error = %err, "invalid JSON, message dead-lettered");
                return MessageOutcome::Reject;
            }
        };

        match self.worker.handle_event(payload).await {
            Ok(()) => {
                self.breaker.record_success();
                MessageOutcome::Ack
            }
            Err(WorkerError::Permanent(reason)) => {
                tracing::warn!(queue, %reason, "permanent failure, message dead-lettered");
                MessageOutcome::Reject
            }
            Err(WorkerError::Temporary(reason)) => {
                self.breaker.record_failure();
                tracing::warn!(queue, %reason, "temporary failure, message requeued");
                MessageOutcome::NackRequeue
            }
        }
    }
}
