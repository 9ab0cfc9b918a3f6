//! Typed gateway webhook events.
//!
//! The gateway delivers `{"type": "...", "data": {"object": {...}}}`
//! payloads. Instead of probing free-form JSON, each event type we handle
//! gets a tagged variant with a typed payload; the webhook router
//! dispatches on the variant and handlers receive fully typed values.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::{SubscriptionId, UserId};

/// A gateway event the billing system understands.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A card was attached to a customer; carries the display digits.
    PaymentMethodAttached(PaymentMethodAttached),

    /// A card binding finished successfully; carries the charge token.
    SetupIntentSucceeded(SetupIntentSucceeded),

    /// A card binding failed at the gateway.
    SetupIntentFailed(SetupIntentFailed),

    /// A payment intent settled successfully.
    PaymentIntentSucceeded(PaymentIntentEvent),

    /// A payment intent failed.
    PaymentIntentFailed(PaymentIntentEvent),

    /// A charge was refunded.
    ChargeRefunded(ChargeRefunded),

    /// Anything else; logged and acknowledged without action.
    Unknown(String),
}

/// Payload of `payment_method.attached`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentMethodAttached {
    /// Gateway customer the card belongs to.
    pub customer: String,

    /// Last four digits of the card.
    pub last4: String,
}

/// Payload of `setup_intent.succeeded`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetupIntentSucceeded {
    /// Gateway customer the card belongs to.
    pub customer: String,

    /// Reusable charge token for the bound card.
    pub payment_method: String,
}

/// Payload of `setup_intent.setup_failed`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetupIntentFailed {
    /// Gateway customer whose binding failed.
    pub customer: String,
}

/// Reconciliation metadata stamped onto intents at creation time.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EventMetadata {
    /// Subscription the intent was created for.
    pub subscription_id: Option<SubscriptionId>,

    /// User who owns the subscription.
    pub user_id: Option<UserId>,
}

/// Payload shared by `payment_intent.succeeded` and
/// `payment_intent.payment_failed`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentIntentEvent {
    /// Gateway intent id.
    pub id: String,

    /// Metadata attached at intent creation.
    #[serde(default)]
    pub metadata: EventMetadata,
}

/// Payload of `charge.refunded`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChargeRefunded {
    /// The intent whose charge was refunded.
    pub payment_intent: String,

    /// Metadata attached at intent creation, when the gateway echoes it.
    #[serde(default)]
    pub metadata: EventMetadata,
}

/// Why a webhook payload could not be turned into a typed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookParseError {
    /// The payload has no `data.object`.
    MissingObject,

    /// The object is missing a field the event type requires.
    MalformedObject { event_type: String, reason: String },
}

impl std::fmt::Display for WebhookParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingObject => write!(f, "webhook payload has no data.object"),
            Self::MalformedObject { event_type, reason } => {
                write!(f, "malformed '{}' payload: {}", event_type, reason)
            }
        }
    }
}

impl std::error::Error for WebhookParseError {}

impl GatewayEvent {
    /// Parse an event from its type tag and `data` value.
    ///
    /// Unrecognized event types parse into `Unknown`; recognized types with
    /// missing fields are parse errors the router logs and drops.
    pub fn parse(event_type: &str, data: &Value) -> Result<Self, WebhookParseError> {
        let object = data.get("object").ok_or(WebhookParseError::MissingObject)?;

        let malformed = |reason: String| WebhookParseError::MalformedObject {
            event_type: event_type.to_string(),
            reason,
        };

        match event_type {
            "payment_method.attached" => {
                // last4 nests under the card object
                let customer = require_str(object, "customer").map_err(&malformed)?;
                let last4 = object
                    .get("card")
                    .and_then(|card| card.get("last4"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("missing card.last4".to_string()))?;
                Ok(GatewayEvent::PaymentMethodAttached(PaymentMethodAttached {
                    customer: customer.to_string(),
                    last4: last4.to_string(),
                }))
            }
            "setup_intent.succeeded" => {
                let payload: SetupIntentSucceeded = serde_json::from_value(object.clone())
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(GatewayEvent::SetupIntentSucceeded(payload))
            }
            "setup_intent.setup_failed" => {
                let payload: SetupIntentFailed = serde_json::from_value(object.clone())
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(GatewayEvent::SetupIntentFailed(payload))
            }
            "payment_intent.succeeded" => {
                let payload: PaymentIntentEvent = serde_json::from_value(object.clone())
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(GatewayEvent::PaymentIntentSucceeded(payload))
            }
            "payment_intent.payment_failed" => {
                let payload: PaymentIntentEvent = serde_json::from_value(object.clone())
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(GatewayEvent::PaymentIntentFailed(payload))
            }
            "charge.refunded" => {
                let payload: ChargeRefunded = serde_json::from_value(object.clone())
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(GatewayEvent::ChargeRefunded(payload))
            }
            other => Ok(GatewayEvent::Unknown(other.to_string())),
        }
    }
}

fn require_str<'a>(object: &'a Value, field: &str) -> Result<&'a str, String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing {}", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_payment_method_attached() {
        let data = json!({
            "object": {
                "customer": "cus_123",
                "card": {"last4": "4242"}
            }
        });
        let event = GatewayEvent::parse("payment_method.attached", &data).unwrap();
        assert_eq!(
            event,
            GatewayEvent::PaymentMethodAttached(PaymentMethodAttached {
                customer: "cus_123".to_string(),
                last4: "4242".to_string(),
            })
        );
    }

    #[test]
    fn attached_without_last4_is_malformed() {
        let data = json!({"object": {"customer": "cus_123"}});
        let result = GatewayEvent::parse("payment_method.attached", &data);
        assert!(matches!(
            result,
            Err(WebhookParseError::MalformedObject { .. })
        ));
    }

    #[test]
    fn parses_setup_intent_succeeded() {
        let data = json!({
            "object": {"customer": "cus_123", "payment_method": "pm_456"}
        });
        let event = GatewayEvent::parse("setup_intent.succeeded", &data).unwrap();
        assert_eq!(
            event,
            GatewayEvent::SetupIntentSucceeded(SetupIntentSucceeded {
                customer: "cus_123".to_string(),
                payment_method: "pm_456".to_string(),
            })
        );
    }

    #[test]
    fn setup_succeeded_without_payment_method_is_malformed() {
        let data = json!({"object": {"customer": "cus_123"}});
        assert!(GatewayEvent::parse("setup_intent.succeeded", &data).is_err());
    }

    #[test]
    fn parses_payment_intent_succeeded_with_metadata() {
        let subscription_id = SubscriptionId::new();
        let user_id = UserId::new();
        let data = json!({
            "object": {
                "id": "pi_123",
                "metadata": {
                    "subscription_id": subscription_id.to_string(),
                    "user_id": user_id.to_string(),
                }
            }
        });
        let event = GatewayEvent::parse("payment_intent.succeeded", &data).unwrap();
        match event {
            GatewayEvent::PaymentIntentSucceeded(payload) => {
                assert_eq!(payload.id, "pi_123");
                assert_eq!(payload.metadata.subscription_id, Some(subscription_id));
                assert_eq!(payload.metadata.user_id, Some(user_id));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn payment_intent_metadata_is_optional() {
        let data = json!({"object": {"id": "pi_123"}});
        let event = GatewayEvent::parse("payment_intent.payment_failed", &data).unwrap();
        match event {
            GatewayEvent::PaymentIntentFailed(payload) => {
                assert_eq!(payload.metadata, EventMetadata::default());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_charge_refunded() {
        let data = json!({"object": {"payment_intent": "pi_123"}});
        let event = GatewayEvent::parse("charge.refunded", &data).unwrap();
        match event {
            GatewayEvent::ChargeRefunded(payload) => {
                assert_eq!(payload.payment_intent, "pi_123");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_event_types_are_tolerated() {
        let data = json!({"object": {}});
        let event = GatewayEvent::parse("invoice.created", &data).unwrap();
        assert_eq!(event, GatewayEvent::Unknown("invoice.created".to_string()));
    }

    #[test]
    fn missing_object_is_an_error() {
        let data = json!({});
        assert_eq!(
            GatewayEvent::parse("setup_intent.succeeded", &data),
            Err(WebhookParseError::MissingObject)
        );
    }
}
