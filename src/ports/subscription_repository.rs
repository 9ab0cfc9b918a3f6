//! SubscriptionRepository port.

use async_trait::async_trait;

use crate::domain::foundation::{BillingError, PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};

/// Equality filters for subscription listings. `None` fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub user_id: Option<UserId>,
    pub plan_id: Option<PlanId>,
    pub status: Option<SubscriptionStatus>,
}

/// Persistence port for subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new subscription.
    ///
    /// The store enforces at most one pending-or-active subscription per
    /// user; the losing insert of a race maps to
    /// `ActiveSubscriptionExists`.
    async fn create(&self, subscription: &Subscription) -> Result<(), BillingError>;

    /// Persist changes to an existing subscription.
    async fn update(&self, subscription: &Subscription) -> Result<(), BillingError>;

    /// Fetch a subscription by id.
    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, BillingError>;

    /// The user's pending-or-active subscription, if any.
    async fn find_live_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, BillingError>;

    /// Active subscriptions whose term ended at or before `now`.
    ///
    /// Used by the expiry sweeper.
    async fn find_expired_active(
        &self,
        now: Timestamp,
    ) -> Result<Vec<Subscription>, BillingError>;

    /// List subscriptions matching the filter.
    async fn list(&self, filter: SubscriptionFilter) -> Result<Vec<Subscription>, BillingError>;

    /// Hard-delete a subscription row.
    async fn delete(&self, id: &SubscriptionId) -> Result<(), BillingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn is_object_safe(_repo: &dyn SubscriptionRepository) {}

    #[test]
    fn filter_fields_default_to_none() {
        let filter = SubscriptionFilter::default();
        assert!(filter.user_id.is_none());
        assert!(filter.plan_id.is_none());
        assert!(filter.status.is_none());
    }
}
