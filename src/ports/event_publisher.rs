//! Publisher ports for the broker-backed side effects.
//!
//! These ports define how the orchestrator emits auth-role changes and user
//! notifications without knowing about the underlying transport. The
//! database commit always happens before a publish; a failed publish is
//! logged by the caller and never fails the originating command, because
//! the database is the source of truth and a re-emitter can replay.

use async_trait::async_trait;

use crate::domain::events::{AuthEvent, NotificationEvent};
use crate::domain::foundation::BillingError;

/// Port for publishing auth-role-change events.
#[async_trait]
pub trait AuthEventPublisher: Send + Sync {
    /// Publish a role change to the auth queue.
    async fn publish_role_change(&self, event: AuthEvent) -> Result<(), BillingError>;
}

/// Port for publishing user notifications.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publish a notification to the notification queue.
    async fn notify(&self, event: NotificationEvent) -> Result<(), BillingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn auth_publisher_is_object_safe(_publisher: &dyn AuthEventPublisher) {}

    #[allow(dead_code)]
    fn notification_publisher_is_object_safe(_publisher: &dyn NotificationPublisher) {}
}
