//! Subscription status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a subscription.
///
/// ```text
/// (create) -> Pending
/// Pending  -> Active     payment succeeded
/// Pending  -> Cancelled  user cancel
/// Active   -> Cancelled  user cancel or refund
/// Active   -> Expired    sweeper (end_date reached, no renewal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created, awaiting first successful payment. Counts against the
    /// one-live-subscription-per-user rule.
    Pending,

    /// Paid and current.
    Active,

    /// Ended by the user or a refund. Terminal.
    Cancelled,

    /// Ended by the sweeper once `end_date` passed. Terminal.
    Expired,
}

impl SubscriptionStatus {
    /// Statuses that block the user from creating another subscription.
    pub fn is_live(&self) -> bool {
        matches!(self, SubscriptionStatus::Pending | SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    const ENTITY: &'static str = "subscription";

    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Pending, Active) | (Pending, Cancelled) | (Active, Cancelled) | (Active, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Cancelled],
            Active => vec![Cancelled, Expired],
            Cancelled => vec![],
            Expired => vec![],
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}
