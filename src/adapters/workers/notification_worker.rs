//! Worker delivering user notifications to the notification service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::events::{NotificationEvent, NOTIFICATION_QUEUE};
use crate::ports::{SidecarClient, WorkerError};

use super::QueueWorker;

/// Consumes `notification_events` and POSTs notices to
/// `{notification_service_url}/{user_id}/notify/`.
pub struct NotificationWorker {
    sidecar: Arc<dyn SidecarClient>,
    base_url: String,
}

impl NotificationWorker {
    pub fn new(sidecar: Arc<dyn SidecarClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { sidecar, base_url }
    }
}

#[async_trait]
impl QueueWorker for NotificationWorker {
    fn queue_name(&self) -> &str {
        NOTIFICATION_QUEUE
    }

    async fn handle_event(&self, payload: serde_json::Value) -> Result<(), WorkerError> {
        let event: NotificationEvent = serde_json::from_value(payload).map_err(|e| {
            WorkerError::Permanent(format!("invalid notification event structure: {}", e))
        })?;

        let url = format!("{}/{}/notify/", self.base_url, event.user_id);
        self.sidecar
            .post(&url, &json!({"notification_data": event.notification_data}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::subscription::SubscriptionStatus;
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
    async fn posts_notification_data_to_user_endpoint() {
        let sidecar = Arc::new(RecordingSidecar::new());
        let worker =
            NotificationWorker::new(sidecar.clone(), "http://notify:8000/api/v1/users");
        let user_id = UserId::new();

        let event =
            NotificationEvent::subscription_status(user_id, SubscriptionStatus::Active);
        worker
            .handle_event(serde_json::to_value(event).unwrap())
            .await
            .unwrap();

        let requests = sidecar.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            format!("http://notify:8000/api/v1/users/{}/notify/", user_id)
        );
        assert_eq!(
            requests[0].1,
            json!({"notification_data": {"topic": "subscription", "status": "active"}})
        );
    }

    #[tokio::test]
    async fn missing_notification_data_is_permanent() {
        let sidecar = Arc::new(RecordingSidecar::new());
        let worker = NotificationWorker::new(sidecar, "http://notify:8000");

        let result = worker
            .handle_event(json!({"user_id": UserId::new()}))
            .await;
        assert!(matches!(result, Err(WorkerError::Permanent(_))));
    }

    #[test]
    fn consumes_notification_queue() {
        let worker = NotificationWorker::new(Arc::new(RecordingSidecar::new()), "http://n");
        assert_eq!(worker.queue_name(), "notification_events");
    }
}
