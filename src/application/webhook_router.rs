//! Gateway webhook router.
//!
//! Stateless dispatch from the gateway's event-type string to the card
//! handlers and the payment handlers. The gateway stops retrying on any
//! 2xx, so every path ends in acknowledged success: unknown events and
//! payloads with missing fields are logged and dropped, and handler
//! errors are logged rather than surfaced.

use std::sync::Arc;

use crate::adapters::stripe::GatewayEvent;
use crate::application::managers::{CardsManager, SubscriptionManager};

/// Routes inbound gateway events to their handlers.
pub struct WebhookRouter {
    cards: Arc<CardsManager>,
    subscriptions: Arc<SubscriptionManager>,
}

impl WebhookRouter {
    pub fn new(cards: Arc<CardsManager>, subscriptions: Arc<SubscriptionManager>) -> Self {
        Self {
            cards,
            subscriptions,
        }
    }

    /// Dispatch one delivery. Never fails: the response to the gateway is
    /// always success.
    pub async fn dispatch(&self, event_type: &str, data: &serde_json::Value) {
        let event = match GatewayEvent::parse(event_type, data) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(event_type, error = %err, "webhook payload dropped");
                return;
            }
        };

        let result = match event {
            GatewayEvent::PaymentMethodAttached(payload) => {
                self.cards.handle_attached(payload).await
            }
            GatewayEvent::SetupIntentSucceeded(payload) => {
                self.cards.handle_setup_succeeded(payload).await
            }
            GatewayEvent::SetupIntentFailed(payload) => {
                self.cards.handle_setup_failed(payload).await
            }
            payment_event @ (GatewayEvent::PaymentIntentSucceeded(_)
            | GatewayEvent::PaymentIntentFailed(_)
            | GatewayEvent::ChargeRefunded(_)) => {
                self.subscriptions.handle_payment_event(payment_event).await
            }
            GatewayEvent::Unknown(event_type) => {
                tracing::warn!(event_type, "unhandled gateway event acknowledged");
                Ok(())
            }
        };

        if let Err(err) = result {
            tracing::error!(event_type, error = %err, "webhook handler failed");
        }
    }
}
