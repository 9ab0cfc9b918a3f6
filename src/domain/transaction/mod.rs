//! Payment transaction entity and status legality.
//!
//! One transaction records one attempt to charge a card for a subscription.
//! A subscription accumulates transactions over time (initial payment,
//! renewals, retries).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BillingError, CardId, StateMachine, SubscriptionId, Timestamp, TransactionId, UserId,
};

/// Processor the charge was routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Stripe,
    Other,
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentType::Stripe => "stripe",
            PaymentType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Settlement status of a transaction.
///
/// Legality table (everything else is rejected):
///
/// ```text
/// Pending -> Success | Failed | Refunded
/// Success -> Refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl StateMachine for TransactionStatus {
    const ENTITY: &'static str = "transaction";

    fn can_transition_to(&self, target: &Self) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, target),
            (Pending, Success) | (Pending, Failed) | (Pending, Refunded) | (Success, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TransactionStatus::*;
        match self {
            Pending => vec![Success, Failed, Refunded],
            Success => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// One charge attempt against a user's card.
///
/// # Invariants
///
/// - `gateway_intent_id`, when present, is unique across transactions
/// - `subscription_id` and `user_card_id` reference existing rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for this transaction.
    pub id: TransactionId,

    /// Subscription being paid for.
    pub subscription_id: SubscriptionId,

    /// Owning user.
    pub user_id: UserId,

    /// Amount in the minor currency unit.
    pub amount: i64,

    /// Processor used.
    pub payment_type: PaymentType,

    /// Settlement status.
    pub status: TransactionStatus,

    /// Card charged.
    pub user_card_id: CardId,

    /// Gateway payment-intent id, attached once the intent exists.
    pub gateway_intent_id: Option<String>,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last updated.
    pub updated_at: Timestamp,
}

impl Transaction {
    /// Create a pending transaction for a charge attempt.
    pub fn create(
        subscription_id: SubscriptionId,
        user_id: UserId,
        amount: i64,
        payment_type: PaymentType,
        user_card_id: CardId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: TransactionId::new(),
            subscription_id,
            user_id,
            amount,
            payment_type,
            status: TransactionStatus::Pending,
            user_card_id,
            gateway_intent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the gateway intent id created for this transaction.
    pub fn attach_intent(&mut self, intent_id: impl Into<String>) {
        self.gateway_intent_id = Some(intent_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Move to `new_status` under the legality table.
    ///
    /// Returns `false` without touching the row when already in
    /// `new_status` (idempotent webhook redelivery).
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for undefined transitions.
    pub fn change_status(&mut self, new_status: TransactionStatus) -> Result<bool, BillingError> {
        if self.status == new_status {
            return Ok(false);
        }
        self.status = self.status.transition_to(new_status)?;
        self.updated_at = Timestamp::now();
        Ok(true)
    }
}
