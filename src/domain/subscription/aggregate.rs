//! Subscription aggregate entity.
//!
//! # Design Decisions
//!
//! - **One live subscription per user**: enforced by a partial unique index
//!   on `(user_id)` over rows in pending/active status
//! - **Terminal statuses clear auto-renewal**: a cancelled or expired
//!   subscription never renews itself
//! - **Same-status change is a no-op**: webhook replays converge instead of
//!   erroring

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BillingError, PlanId, StateMachine, SubscriptionId, Timestamp, UserId,
};

use super::SubscriptionStatus;

/// A user's time-bounded subscription to a plan.
///
/// # Invariants
///
/// - `end_date >= start_date`
/// - status `Cancelled` or `Expired` implies `auto_renewal == false`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: SubscriptionId,

    /// Owning user.
    pub user_id: UserId,

    /// Plan this subscription was purchased from.
    pub plan_id: PlanId,

    /// Current lifecycle status.
    pub status: SubscriptionStatus,

    /// When the subscription term began.
    pub start_date: Timestamp,

    /// When the subscription term ends.
    pub end_date: Timestamp,

    /// Whether the sweeper renews this subscription at term end.
    pub auto_renewal: bool,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last updated.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Create a pending subscription whose term is derived from the plan's
    /// duration.
    pub fn create(
        user_id: UserId,
        plan_id: PlanId,
        duration_days: i32,
        auto_renewal: bool,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan_id,
            status: SubscriptionStatus::Pending,
            start_date: now,
            end_date: now.add_days(i64::from(duration_days)),
            auto_renewal,
            created_at: now,
            updated_at: now,
        }
    }

    /// Cancel this subscription, ending the term immediately.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionCancel` unless the status is pending or active.
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        if !self.status.is_live() {
            return Err(BillingError::SubscriptionCancel {
                subscription_id: self.id,
                status: self.status.to_string(),
            });
        }
        self.status = self.status.transition_to(SubscriptionStatus::Cancelled)?;
        self.auto_renewal = false;
        self.end_date = Timestamp::now();
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Shift the term end by another round of the plan's duration.
    pub fn renew(&mut self, duration_days: i32) {
        self.end_date = self.end_date.add_days(i64::from(duration_days));
        self.updated_at = Timestamp::now();
    }

    /// Flip the auto-renewal flag, returning the new value.
    pub fn toggle_auto_renewal(&mut self) -> bool {
        self.auto_renewal = !self.auto_renewal;
        self.updated_at = Timestamp::now();
        self.auto_renewal
    }

    /// Move to `new_status`, enforcing the legality table.
    ///
    /// Returns `false` without touching the row when the subscription is
    /// already in `new_status`, so replayed webhooks converge.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for any move the state machine forbids.
    pub fn change_status(&mut self, new_status: SubscriptionStatus) -> Result<bool, BillingError> {
        if self.status == new_status {
            return Ok(false);
        }
        self.status = self.status.transition_to(new_status)?;
        if !new_status.is_live() {
            self.auto_renewal = false;
        }
        self.updated_at = Timestamp::now();
        Ok(true)
    }

    /// Whether the term has ended relative to `now`.
    pub fn is_ended(&self, now: Timestamp) -> bool {
        !self.end_date.is_after(&now)
    }
}
