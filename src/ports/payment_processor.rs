//! PaymentProcessor port for the external card/payment gateway.
//!
//! Isolates the raw gateway SDK behind a small contract: customer creation,
//! card-binding sessions, card detach and payment-intent lifecycle.
//!
//! # Design
//!
//! - **Validated requests**: intent requests are checked before any network
//!   call is issued
//! - **Classified errors**: every failure is either a permanent client error
//!   (gateway rejected the request) or a transient server error (retryable;
//!   counts as a circuit-breaker failure at callers)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BillingError, SubscriptionId, UserId};

/// Port for the payment gateway.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a customer at the gateway, returning its id.
    ///
    /// Called once per user, when they bind their first card.
    async fn create_customer(&self) -> Result<String, GatewayError>;

    /// Open a card-binding session for the customer.
    ///
    /// Returns the URL the user is redirected to.
    async fn create_card_binding_session(&self, customer_id: &str)
        -> Result<String, GatewayError>;

    /// Detach a previously bound card from its customer.
    async fn detach_card(&self, payment_method_token: &str) -> Result<(), GatewayError>;

    /// Create a payment intent.
    ///
    /// When the request carries a `payment_method_token` the intent is
    /// confirmed off-session.
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Cancel a payment intent that will not be completed.
    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<(), GatewayError>;
}

/// Identifiers stamped onto every intent so webhooks can be reconciled even
/// if the intent id was never written back to the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
}

/// Validated request to create a payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
    /// Amount in the minor currency unit; strictly positive.
    pub amount: i64,

    /// Three-letter lowercase currency code.
    pub currency: String,

    /// Gateway customer to charge.
    pub customer_id: String,

    /// Reusable charge token; triggers off-session confirmation.
    pub payment_method_token: Option<String>,

    /// Optional human-readable description.
    pub description: Option<String>,

    /// Reconciliation metadata.
    pub metadata: IntentMetadata,
}

impl PaymentIntentRequest {
    /// Build a request, rejecting invalid amounts and currency codes before
    /// anything reaches the network.
    pub fn new(
        amount: i64,
        currency: impl Into<String>,
        customer_id: impl Into<String>,
        metadata: IntentMetadata,
    ) -> Result<Self, BillingError> {
        if amount <= 0 {
            return Err(BillingError::validation(
                "amount",
                "must be strictly positive",
            ));
        }
        let currency = currency.into();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BillingError::validation(
                "currency",
                "must be a 3-letter code",
            ));
        }
        Ok(Self {
            amount,
            currency: currency.to_ascii_lowercase(),
            customer_id: customer_id.into(),
            payment_method_token: None,
            description: None,
            metadata,
        })
    }

    /// Attach a charge token for off-session confirmation.
    pub fn with_payment_method(mut self, token: impl Into<String>) -> Self {
        self.payment_method_token = Some(token.into());
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A payment intent created at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Gateway-assigned intent id (unique).
    pub intent_id: String,

    /// Client secret for front-end confirmation flows, when issued.
    pub client_secret: Option<String>,
}

/// Classification of gateway failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// The gateway rejected the request; retrying will not help.
    PermanentClientError,

    /// The gateway or the network failed; retryable, counts toward the
    /// circuit breaker.
    TransientServerError,
}

/// Error from a gateway operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    /// A rejection that retrying cannot fix.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::PermanentClientError,
            message: message.into(),
        }
    }

    /// A retryable gateway or network failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::TransientServerError,
            message: message.into(),
        }
    }

    /// Whether the failure is retryable.
    pub fn is_transient(&self) -> bool {
        self.kind == GatewayErrorKind::TransientServerError
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            GatewayErrorKind::PermanentClientError => "permanent",
            GatewayErrorKind::TransientServerError => "transient",
        };
        write!(f, "gateway error ({}): {}", kind, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        BillingError::payment_create(err.is_transient(), err.message)
    }
}
