//! Error types for the billing domain.
//!
//! One taxonomy is shared by services, managers and adapters; the HTTP layer
//! maps variants to status codes.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | AlreadyExists | 400 |
//! | ActiveSubscriptionExists | 400 |
//! | SubscriptionCancel | 400 |
//! | InvalidTransition | 400 |
//! | AlreadyDefault | 400 |
//! | AccessDenied | 403 |
//! | Validation | 422 |
//! | PaymentCreate (permanent) | 400 |
//! | PaymentCreate (transient) | 502 |
//! | Database / Publish | 500 |

use thiserror::Error;

use super::{SubscriptionId, UserId};

/// Billing domain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Entity lookup failed.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule was violated (duplicate plan title, ...).
    #[error("{entity} already exists: {detail}")]
    AlreadyExists { entity: &'static str, detail: String },

    /// User already holds a pending or active subscription.
    #[error("user {0} already has an active or pending subscription")]
    ActiveSubscriptionExists(UserId),

    /// Subscription is not in a cancellable state.
    #[error("subscription {subscription_id} cannot be cancelled from status {status}")]
    SubscriptionCancel {
        subscription_id: SubscriptionId,
        status: String,
    },

    /// A state-machine transition was rejected.
    #[error("{entity}: illegal transition {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The card is already the user's default.
    #[error("card is already set as default")]
    AlreadyDefault,

    /// Caller does not own the resource (and is not an admin).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Request payload failed validation.
    #[error("validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// The gateway refused or failed to create a payment intent.
    #[error("payment intent creation failed: {detail}")]
    PaymentCreate { transient: bool, detail: String },

    /// Database error. The enclosing transaction has been rolled back.
    #[error("database error: {0}")]
    Database(String),

    /// Broker publish failed. Logged by the orchestrator, never fatal to
    /// the originating command.
    #[error("failed to publish to queue '{queue}': {detail}")]
    Publish { queue: String, detail: String },
}

impl BillingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BillingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, detail: impl Into<String>) -> Self {
        BillingError::AlreadyExists {
            entity,
            detail: detail.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        BillingError::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn access_denied(detail: impl Into<String>) -> Self {
        BillingError::AccessDenied(detail.into())
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn payment_create(transient: bool, detail: impl Into<String>) -> Self {
        BillingError::PaymentCreate {
            transient,
            detail: detail.into(),
        }
    }

    pub fn database(detail: impl ToString) -> Self {
        BillingError::Database(detail.to_string())
    }

    pub fn publish(queue: impl Into<String>, detail: impl Into<String>) -> Self {
        BillingError::Publish {
            queue: queue.into(),
            detail: detail.into(),
        }
    }

    /// True for infrastructure failures that warrant a 5xx response.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            BillingError::Database(_)
                | BillingError::Publish { .. }
                | BillingError::PaymentCreate { transient: true, .. }
        )
    }
}
