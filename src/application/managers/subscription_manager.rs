//! Top-level subscription orchestrator.
//!
//! Composes the entity services, the payment manager and the broker
//! publishers. Every command changes database state first and publishes
//! afterwards; a failed publish is logged and never fails the command, so
//! replays of the same webhook converge on the same state with no
//! duplicate side effects.

use std::sync::Arc;

use crate::adapters::stripe::GatewayEvent;
use crate::application::managers::PaymentManager;
use crate::application::services::{
    CreateSubscription, PlanService, SubscriptionService,
};
use crate::domain::events::{AuthEvent, NotificationEvent};
use crate::domain::foundation::{BillingError, CardId, PlanId, SubscriptionId, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::domain::transaction::Transaction;
use crate::ports::{AuthEventPublisher, CardRepository, NotificationPublisher};

/// Currency subscriptions are charged in.
const CHARGE_CURRENCY: &str = "usd";

/// Orchestrates the subscription lifecycle with its side effects.
pub struct SubscriptionManager {
    subscriptions: Arc<SubscriptionService>,
    plans: Arc<PlanService>,
    payments: Arc<PaymentManager>,
    cards: Arc<dyn CardRepository>,
    auth_events: Arc<dyn AuthEventPublisher>,
    notifications: Arc<dyn NotificationPublisher>,
}

impl SubscriptionManager {
    pub fn new(
        subscriptions: Arc<SubscriptionService>,
        plans: Arc<PlanService>,
        payments: Arc<PaymentManager>,
        cards: Arc<dyn CardRepository>,
        auth_events: Arc<dyn AuthEventPublisher>,
        notifications: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            payments,
            cards,
            auth_events,
            notifications,
        }
    }

    /// Create a pending subscription and notify the user.
    pub async fn create_subscription(
        &self,
        user_id: UserId,
        data: CreateSubscription,
    ) -> Result<Subscription, BillingError> {
        let subscription = self.subscriptions.create(user_id, data).await?;
        self.notify_subscription_status(user_id, subscription.status)
            .await;
        Ok(subscription)
    }

    /// Charge a chosen card for a subscription, at the plan's price.
    pub async fn initiate_payment(
        &self,
        user_id: UserId,
        card_id: CardId,
        subscription_id: SubscriptionId,
    ) -> Result<Transaction, BillingError> {
        let subscription = self
            .subscriptions
            .get_owned(user_id, subscription_id)
            .await?;
        let plan = self.plans.get(&subscription.plan_id).await?;

        self.payments
            .charge_subscription(
                user_id,
                card_id,
                subscription.id,
                plan.price,
                CHARGE_CURRENCY,
            )
            .await
    }

    /// Activate after a successful payment: role upgrade + notification.
    ///
    /// A replay finds the subscription already active and publishes
    /// nothing.
    pub async fn activate_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<(), BillingError> {
        let outcome = self
            .subscriptions
            .change_status(subscription_id, SubscriptionStatus::Active)
            .await?;

        if outcome.changed {
            let user_id = outcome.subscription.user_id;
            self.publish_role_change(AuthEvent::upgrade_to_subscriber(user_id))
                .await;
            self.notify_subscription_status(user_id, SubscriptionStatus::Active)
                .await;
        }
        Ok(())
    }

    /// Cancel on user request: role downgrade + notification.
    pub async fn cancel_subscription(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, BillingError> {
        let subscription = self.subscriptions.cancel(user_id, subscription_id).await?;

        self.publish_role_change(AuthEvent::downgrade_to_basic(user_id))
            .await;
        self.notify_subscription_status(user_id, SubscriptionStatus::Cancelled)
            .await;
        Ok(subscription)
    }

    /// Extend the term by another round of the plan and charge the
    /// default card.
    pub async fn renew_subscription(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
        plan_id: PlanId,
    ) -> Result<Subscription, BillingError> {
        let subscription = self
            .subscriptions
            .renew(user_id, subscription_id, plan_id)
            .await?;

        let card = self
            .cards
            .find_default_for_user(&user_id)
            .await?
            .ok_or_else(|| BillingError::not_found("default card", user_id))?;

        self.initiate_payment(user_id, card.id, subscription.id)
            .await?;
        Ok(subscription)
    }

    /// Pure passthrough to the subscription service.
    pub async fn toggle_auto_renewal(
        &self,
        user_id: UserId,
        subscription_id: SubscriptionId,
    ) -> Result<Subscription, BillingError> {
        self.subscriptions
            .toggle_auto_renewal(user_id, subscription_id)
            .await
    }

    /// Expire a subscription whose term ended.
    ///
    /// `role_detachment` is false on the auto-renewal path, where the
    /// replacement subscription keeps the user subscribed.
    pub async fn mark_expired(
        &self,
        subscription_id: SubscriptionId,
        role_detachment: bool,
    ) -> Result<(), BillingError> {
        let outcome = self
            .subscriptions
            .change_status(subscription_id, SubscriptionStatus::Expired)
            .await?;

        if outcome.changed {
            let user_id = outcome.subscription.user_id;
            if role_detachment {
                self.publish_role_change(AuthEvent::downgrade_to_basic(user_id))
                    .await;
            }
            self.notify_subscription_status(user_id, SubscriptionStatus::Expired)
                .await;
        }
        Ok(())
    }

    /// Sweeper path for an ended subscription with auto-renewal on.
    ///
    /// The old row is expired first (freeing the one-live-per-user slot,
    /// with no role downgrade), then a fresh pending subscription on the
    /// same plan is created and charged against the default card. A failed
    /// charge leaves the new subscription pending; the next sweep or a
    /// user retry picks it up.
    pub async fn renew_expired_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, BillingError> {
        self.mark_expired(subscription.id, false).await?;

        let replacement = self
            .create_subscription(
                subscription.user_id,
                CreateSubscription {
                    plan_id: subscription.plan_id,
                    auto_renewal: true,
                },
            )
            .await?;

        let card = self
            .cards
            .find_default_for_user(&subscription.user_id)
            .await?
            .ok_or_else(|| {
                BillingError::not_found("default card", subscription.user_id)
            })?;

        if let Err(err) = self
            .initiate_payment(subscription.user_id, card.id, replacement.id)
            .await
        {
            tracing::warn!(
                subscription_id = %replacement.id,
                error = %err,
                "renewal charge failed, subscription left pending"
            );
        }

        Ok(replacement)
    }

    /// Dispatch a payment-side gateway event.
    pub async fn handle_payment_event(&self, event: GatewayEvent) -> Result<(), BillingError> {
        match event {
            GatewayEvent::PaymentIntentSucceeded(payload) => {
                let outcome = self.payments.handle_payment_succeeded(&payload).await?;
                if outcome.changed {
                    self.activate_subscription(outcome.transaction.subscription_id)
                        .await?;
                }
                Ok(())
            }
            GatewayEvent::PaymentIntentFailed(payload) => {
                let outcome = self.payments.handle_payment_failed(&payload).await?;
                if outcome.changed {
                    let transaction = &outcome.transaction;
                    if let Err(err) = self
                        .notifications
                        .notify(NotificationEvent::transaction_status(
                            transaction.user_id,
                            transaction.status,
                        ))
                        .await
                    {
                        tracing::warn!(error = %err, "transaction notification publish failed");
                    }
                }
                Ok(())
            }
            GatewayEvent::ChargeRefunded(payload) => {
                let outcome = self.payments.handle_payment_refunded(&payload).await?;
                if outcome.changed {
                    let transaction = &outcome.transaction;
                    match self
                        .cancel_subscription(transaction.user_id, transaction.subscription_id)
                        .await
                    {
                        Ok(_) => {}
                        // The user may have cancelled before the refund
                        // landed; the refund still stands.
                        Err(BillingError::SubscriptionCancel { .. }) => {
                            tracing::info!(
                                subscription_id = %transaction.subscription_id,
                                "refunded subscription was already closed"
                            );
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(())
            }
            other => {
                tracing::warn!(?other, "non-payment event reached the payment handler");
                Ok(())
            }
        }
    }

    async fn publish_role_change(&self, event: AuthEvent) {
        if let Err(err) = self.auth_events.publish_role_change(event).await {
            tracing::warn!(error = %err, "auth role publish failed, relying on replay");
        }
    }

    async fn notify_subscription_status(&self, user_id: UserId, status: SubscriptionStatus) {
        let event = NotificationEvent::subscription_status(user_id, status);
        if let Err(err) = self.notifications.notify(event).await {
            tracing::warn!(error = %err, "subscription notification publish failed");
        }
    }
}
