//! Stripe gateway adapter.
//!
//! Implements the `PaymentProcessor` port against the Stripe REST API and
//! provides the typed webhook payloads the webhook router dispatches on.

mod gateway;
mod mock_processor;
mod webhook_types;

pub use gateway::{StripeConfig, StripeGateway};
pub use mock_processor::MockPaymentProcessor;
pub use webhook_types::{
    ChargeRefunded, EventMetadata, GatewayEvent, PaymentIntentEvent, PaymentMethodAttached,
    SetupIntentFailed, SetupIntentSucceeded, WebhookParseError,
};
