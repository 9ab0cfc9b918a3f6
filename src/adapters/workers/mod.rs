//! Queue workers - consumers delivering billing events to HTTP sidecars.

mod auth_worker;
mod http_sidecar;
mod notification_worker;
mod queue_worker;

pub use auth_worker::AuthWorker;
pub use http_sidecar::HttpSidecarClient;
pub use notification_worker::NotificationWorker;
pub use queue_worker::{MessageOutcome, QueueWorker, WorkerProcessor};
