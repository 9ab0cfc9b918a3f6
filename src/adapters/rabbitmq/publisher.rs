//! RabbitMQ implementation of the publisher ports.
//!
//! Messages are JSON bodies published persistently to the billing exchange,
//! routed by queue name. Callers treat a publish failure as non-fatal; the
//! database commit that preceded it is the source of truth.

use async_trait::async_trait;
use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use serde::Serialize;

use crate::domain::events::{AuthEvent, NotificationEvent, AUTH_QUEUE, NOTIFICATION_QUEUE};
use crate::domain::foundation::BillingError;
use crate::ports::{AuthEventPublisher, NotificationPublisher};

/// Persistent delivery mode per AMQP 0.9.1.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Publishes billing events to the broker.
///
/// One instance implements both publisher ports; the channel is shared per
/// process.
pub struct RabbitEventPublisher {
    channel: Channel,
    exchange: String,
}

impl RabbitEventPublisher {
    /// Create a publisher over an already-declared topology.
    pub fn new(channel: Channel, exchange: impl Into<String>) -> Self {
        Self {
            channel,
            exchange: exchange.into(),
        }
    }

    async fn publish_json<T: Serialize>(
        &self,
        queue: &str,
        payload: &T,
    ) -> Result<(), BillingError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| BillingError::publish(queue, format!("serialization failed: {}", e)))?;

        self.channel
            .basic_publish(
                &self.exchange,
                queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(DELIVERY_MODE_PERSISTENT),
            )
            .await
            .map_err(|e| BillingError::publish(queue, e.to_string()))?
            .await
            .map_err(|e| BillingError::publish(queue, e.to_string()))?;

        tracing::debug!(queue, "published billing event");
        Ok(())
    }
}

#[async_trait]
impl AuthEventPublisher for RabbitEventPublisher {
    async fn publish_role_change(&self, event: AuthEvent) -> Result<(), BillingError> {
        self.publish_json(AUTH_QUEUE, &event).await
    }
}

#[async_trait]
impl NotificationPublisher for RabbitEventPublisher {
    async fn notify(&self, event: NotificationEvent) -> Result<(), BillingError> {
        self.publish_json(NOTIFICATION_QUEUE, &event).await
    }
}
