//! Subscription service.
//!
//! Guarded lifecycle transitions, ownership checks and renewal date math
//! over the subscription repository.

use std::sync::Arc;

use crate::domain::foundation::{BillingError, PlanId, SubscriptionId, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{PlanRepository, SubscriptionFilter, SubscriptionRepository};

/// Input for creating a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub plan_id: PlanId,
    pub auto_renewal: bool,
}

/// Result of an internal status change.
#[derive(Debug, Clone)]
pub struct ChangeStatusOutcome {
    /// The subscription after the call.
    pub subscription: Subscription,

    /// False when the row was already in the requested status.
    pub changed: bool,
}

/// Subscription CRUD plus guarded transitions.
pub struct SubscriptionService {
    repository: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
}

impl SubscriptionService {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
    ) -> Self {
        Self { repository, plans }
    }

    /// Create a pending subscription for the user.
    ///
    /// # Errors
    ///
    /// `ActiveSubscriptionExists` if the user already holds a live
    /// subscription (checked up front, and enforced again by the store's
    /// unique constraint under races), `NotFound` for a missing plan.
    pub async fn create(
        &self,
        user_id: UserId,
        data: CreateSubscription,
    ) -> Result<Subscription, BillingError> {
        if self.repository.find_live_for_user(&user_id).await?.is_some() {
            return Err(BillingError::ActiveSubscriptionExists(user_id));
        }

        let plan = self
            .plans
            .find_by_id(&data.plan_id)
            .await?
            .ok_or_else(|| BillingError::not_found("plan", data.plan_id))?;

        let subscription =
            Subscription::create(user_id, plan.id, plan.duration_days, data.auto_renewal);
        self.repository.create(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %user_id,
            plan_id = %plan.id,
            "subscription created"
        );
        Ok(subscription)
    }

    /// Cancel the user's subscription, ending its term now.
    ///
    /// # Errors
    ///
    /// `AccessDenied` for a non-owner, `SubscriptionCancel` unless the
    /// status is pending or active.
    pub async fn cancel(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, BillingError> {
        let mut subscription = self.get_owned(user_id, subscription_id).await?;
        subscription.cancel()?;
        self.repository.update(&subscription).await?;

        tracing::info!(subscription_id = %subscription.id, "subscription cancelled");
        Ok(subscription)
    }

    /// Shift the subscription's end date by the plan's duration.
    ///
    /// Does not change the status; payment is the orchestrator's concern.
    pub async fn renew(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
        plan_id: PlanId,
    ) -> Result<Subscription, BillingError> {
        let plan = self
            .plans
            .find_by_id(&plan_id)
            .await?
            .ok_or_else(|| BillingError::not_found("plan", plan_id))?;

        let mut subscription = self.get_owned(user_id, subscription_id).await?;
        subscription.renew(plan.duration_days);
        self.repository.update(&subscription).await?;

        Ok(subscription)
    }

    /// Flip the auto-renewal flag.
    pub async fn toggle_auto_renewal(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, BillingError> {
        let mut subscription = self.get_owned(user_id, subscription_id).await?;
        subscription.toggle_auto_renewal();
        self.repository.update(&subscription).await?;
        Ok(subscription)
    }

    /// Internal transition used by the payment path and the sweeper.
    ///
    /// Re-reads the row, checks the legality table and persists. A request
    /// for the status the row already holds is a no-op reported through
    /// `changed`.
    pub async fn change_status(
        &self,
        subscription_id: SubscriptionId,
        new_status: SubscriptionStatus,
    ) -> Result<ChangeStatusOutcome, BillingError> {
        let mut subscription = self.get_any(subscription_id).await?;
        let changed = subscription.change_status(new_status)?;
        if changed {
            self.repository.update(&subscription).await?;
            tracing::info!(
                subscription_id = %subscription.id,
                status = %new_status,
                "subscription status changed"
            );
        }
        Ok(ChangeStatusOutcome {
            subscription,
            changed,
        })
    }

    /// Fetch the subscription if the user owns it.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `AccessDenied` for a non-owner.
    pub async fn get_owned(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, BillingError> {
        let subscription = self.get_any(subscription_id).await?;
        if subscription.user_id != user_id {
            return Err(BillingError::access_denied(
                "subscription belongs to another user",
            ));
        }
        Ok(subscription)
    }

    /// Fetch without an ownership check (admin and internal paths).
    pub async fn get_any(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, BillingError> {
        self.repository
            .find_by_id(&subscription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("subscription", subscription_id))
    }

    /// List subscriptions matching the filter.
    pub async fn list(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<Vec<Subscription>, BillingError> {
        self.repository.list(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::SubscriptionPlan;
    use crate::ports::PlanFilter;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::foundation::Timestamp;

    struct InMemorySubscriptionRepository {
        subscriptions: Mutex<Vec<Subscription>>,
    }

    impl InMemorySubscriptionRepository {
        fn new() -> Self {
            Self {
                subscriptions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SubscriptionRepository for InMemorySubscriptionRepository {
        async fn create(&self, subscription: &Subscription) -> Result<(), BillingError> {
            let mut subscriptions = self.subscriptions.lock().unwrap();
            if subscriptions
                .iter()
                .any(|s| s.user_id == subscription.user_id && s.status.is_live())
            {
                return Err(BillingError::ActiveSubscriptionExists(subscription.user_id));
            }
            subscriptions.push(subscription.clone());
            Ok(())
        }

        async fn update(&self, subscription: &Subscription) -> Result<(), BillingError> {
            let mut subscriptions = self.subscriptions.lock().unwrap();
            match subscriptions.iter_mut().find(|s| s.id == subscription.id) {
                Some(stored) => {
                    *stored = subscription.clone();
                    Ok(())
                }
                None => Err(BillingError::not_found("subscription", subscription.id)),
            }
        }

        async fn find_by_id(
            &self,
            id: &SubscriptionId,
        ) -> Result<Option<Subscription>, BillingError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.id == id)
                .cloned())
        }

        async fn find_live_for_user(
            &self,
            user_id: &UserId,
        ) -> Result<Option<Subscription>, BillingError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.user_id == user_id && s.status.is_live())
                .cloned())
        }

        async fn find_expired_active(
            &self,
            now: Timestamp,
        ) -> Result<Vec<Subscription>, BillingError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.status == SubscriptionStatus::Active && s.is_ended(now))
                .cloned()
                .collect())
        }

        async fn list(
            &self,
            filter: SubscriptionFilter,
        ) -> Result<Vec<Subscription>, BillingError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .filter(|s| filter.user_id.map_or(true, |u| s.user_id == u))
                .filter(|s| filter.plan_id.map_or(true, |p| s.plan_id == p))
                .filter(|s| filter.status.map_or(true, |st| s.status == st))
                .cloned()
                .collect())
        }

        async fn delete(&self, id: &SubscriptionId) -> Result<(), BillingError> {
            self.subscriptions.lock().unwrap().retain(|s| &s.id != id);
            Ok(())
        }
    }

    struct StaticPlanRepository {
        plans: Vec<SubscriptionPlan>,
    }

    #[async_trait]
    impl PlanRepository for StaticPlanRepository {
        async fn create(&self, _plan: &SubscriptionPlan) -> Result<(), BillingError> {
            Ok(())
        }

        async fn update(&self, _plan: &SubscriptionPlan) -> Result<(), BillingError> {
            Ok(())
        }

        async fn find_by_id(
            &self,
            id: &PlanId,
        ) -> Result<Option<SubscriptionPlan>, BillingError> {
            Ok(self.plans.iter().find(|p| &p.id == id).cloned())
        }

        async fn find_by_title(
            &self,
            _title: &str,
        ) -> Result<Option<SubscriptionPlan>, BillingError> {
            Ok(None)
        }

        async fn list(
            &self,
            _filter: PlanFilter,
        ) -> Result<Vec<SubscriptionPlan>, BillingError> {
            Ok(self.plans.clone())
        }

        async fn delete(&self, _id: &PlanId) -> Result<(), BillingError> {
            Ok(())
        }
    }

    fn monthly_plan() -> SubscriptionPlan {
        SubscriptionPlan::new("Monthly", "30 days", 1000, 30).unwrap()
    }

    fn service_with_plan(plan: SubscriptionPlan) -> SubscriptionService {
        SubscriptionService::new(
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(StaticPlanRepository { plans: vec![plan] }),
        )
    }

    #[tokio::test]
    async fn creates_pending_subscription_with_plan_term() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let user_id = UserId::new();

        let subscription = service
            .create(
                user_id,
                CreateSubscription {
                    plan_id: plan.id,
                    auto_renewal: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Pending);
        assert_eq!(
            subscription.end_date,
            subscription.start_date.add_days(30)
        );
    }

    #[tokio::test]
    async fn second_live_subscription_is_rejected() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let user_id = UserId::new();
        let data = CreateSubscription {
            plan_id: plan.id,
            auto_renewal: false,
        };

        service.create(user_id, data.clone()).await.unwrap();
        let result = service.create(user_id, data).await;
        assert!(matches!(
            result,
            Err(BillingError::ActiveSubscriptionExists(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_subscription_frees_the_slot() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let user_id = UserId::new();
        let data = CreateSubscription {
            plan_id: plan.id,
            auto_renewal: false,
        };

        let first = service.create(user_id, data.clone()).await.unwrap();
        service.cancel(user_id, first.id).await.unwrap();

        assert!(service.create(user_id, data).await.is_ok());
    }

    #[tokio::test]
    async fn missing_plan_is_not_found() {
        let service = service_with_plan(monthly_plan());
        let result = service
            .create(
                UserId::new(),
                CreateSubscription {
                    plan_id: PlanId::new(),
                    auto_renewal: false,
                },
            )
            .await;
        assert!(matches!(result, Err(BillingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn cancel_by_non_owner_is_denied() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let owner = UserId::new();

        let subscription = service
            .create(
                owner,
                CreateSubscription {
                    plan_id: plan.id,
                    auto_renewal: false,
                },
            )
            .await
            .unwrap();

        let result = service.cancel(UserId::new(), subscription.id).await;
        assert!(matches!(result, Err(BillingError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn renew_shifts_end_date_without_status_change() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let user_id = UserId::new();

        let subscription = service
            .create(
                user_id,
                CreateSubscription {
                    plan_id: plan.id,
                    auto_renewal: false,
                },
            )
            .await
            .unwrap();
        let old_end = subscription.end_date;

        let renewed = service
            .renew(user_id, subscription.id, plan.id)
            .await
            .unwrap();
        assert_eq!(renewed.end_date, old_end.add_days(30));
        assert_eq!(renewed.status, SubscriptionStatus::Pending);
    }

    #[tokio::test]
    async fn toggle_flips_auto_renewal() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let user_id = UserId::new();

        let subscription = service
            .create(
                user_id,
                CreateSubscription {
                    plan_id: plan.id,
                    auto_renewal: false,
                },
            )
            .await
            .unwrap();

        let toggled = service
            .toggle_auto_renewal(user_id, subscription.id)
            .await
            .unwrap();
        assert!(toggled.auto_renewal);

        let toggled_back = service
            .toggle_auto_renewal(user_id, subscription.id)
            .await
            .unwrap();
        assert!(!toggled_back.auto_renewal);
    }

    #[tokio::test]
    async fn change_status_enforces_legality() {
        let plan = monthly_plan();
        let service = service_with_plan(plan.clone());
        let user_id = UserId::new();

        let subscription = service
            .create(
                user_id,
                CreateSubscription {
                    plan_id: plan.id,
                    auto_renewal: false,
                },
            )
            .await
            .unwrap();

        let outcome = service
            .change_status(subscription.id, SubscriptionStatus::Active)
            .await
            .unwrap();
        assert!(outcome.changed);

        // Replays converge without error.
        let replay = service
            .change_status(subscription.id, SubscriptionStatus::Active)
            .await
            .unwrap();
        assert!(!replay.changed);

        // Pending-only moves are rejected from Active.
        service.cancel(user_id, subscription.id).await.unwrap();
        let illegal = service
            .change_status(subscription.id, SubscriptionStatus::Active)
            .await;
        assert!(matches!(
            illegal,
            Err(BillingError::InvalidTransition { .. })
        ));
    }
}
