//! Worker delivering auth-role changes to the auth service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::events::{AuthEvent, AUTH_QUEUE};
use crate::ports::{SidecarClient, WorkerError};

use super::QueueWorker;

/// Consumes `auth_events` and POSTs role changes to
/// `{auth_service_url}/{user_id}/role/`.
pub struct AuthWorker {
    sidecar: Arc<dyn SidecarClient>,
    base_url: String,
}

impl AuthWorker {
    pub fn new(sidecar: Arc<dyn SidecarClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { sidecar, base_url }
    }
}

#[async_trait]
impl QueueWorker for AuthWorker {
    fn queue_name(&self) -> &str {
        AUTH_QUEUE
    }

    async fn handle_event(&self, payload: serde_json::Value) -> Result<(), WorkerError> {
        let event: AuthEvent = serde_json::from_value(payload).map_err(|e| {
            WorkerError::Permanent(format!("invalid auth event structure: {}", e))
        })?;

        let url = format!("{}/{}/role/", self.base_url, event.user_id);
        self.sidecar.post(&url, &json!({"role": event.role})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::sync::Mutex;

    struct RecordingSidecar {
        requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl RecordingSidecar {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SidecarClient for RecordingSidecar {
        async fn post(
            &self,
            url: &str,
            payload: &serde_json::Value,
        ) -> Result<(), WorkerError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn posts_role_to_user_endpoint() {
        let sidecar = Arc::new(RecordingSidecar::new());
        let worker = AuthWorker::new(sidecar.clone(), "http://auth:8000/api/v1/users/");
        let user_id = UserId::new();

        let payload = serde_json::to_value(AuthEvent::upgrade_to_subscriber(user_id)).unwrap();
        worker.handle_event(payload).await.unwrap();

        let requests = sidecar.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            format!("http://auth:8000/api/v1/users/{}/role/", user_id)
        );
        assert_eq!(requests[0].1, json!({"role": "subscriber"}));
    }

    #[tokio::test]
    async fn malformed_event_is_permanent() {
        let sidecar = Arc::new(RecordingSidecar::new());
        let worker = AuthWorker::new(sidecar.clone(), "http://auth:8000");

        let result = worker.handle_event(json!({"user_id": "abc"})).await;
        assert!(matches!(result, Err(WorkerError::Permanent(_))));
        assert!(sidecar.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn consumes_auth_queue() {
        let worker = AuthWorker::new(Arc::new(RecordingSidecar::new()), "http://auth");
        assert_eq!(worker.queue_name(), "auth_events");
    }
}
