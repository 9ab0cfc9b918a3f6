//! End-to-end billing scenarios over in-memory fakes.
//!
//! Drives the managers and the webhook router exactly the way the HTTP
//! adapters and the gateway do: commands in, webhook JSON in, then asserts
//! on database state and published broker events. No external services.

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use billing_api::adapters::stripe::MockPaymentProcessor;
use billing_api::application::{
    CardsManager, CreateSubscription, ExpirySweeper, PaymentManager, PlanService,
    SubscriptionManager, SubscriptionService, TransactionService, WebhookRouter,
};
use billing_api::domain::card::{CardStatus, UserCard};
use billing_api::domain::events::{AuthEvent, NotificationEvent};
use billing_api::domain::foundation::{
    BillingError, CardId, PlanId, SubscriptionId, Timestamp, TransactionId, UserId, UserRole,
};
use billing_api::domain::plan::SubscriptionPlan;
use billing_api::domain::subscription::{Subscription, SubscriptionStatus};
use billing_api::domain::transaction::{Transaction, TransactionStatus};
use billing_api::ports::{
    AuthEventPublisher, CardRepository, NotificationPublisher, PlanFilter, PlanRepository,
    SubscriptionFilter, SubscriptionRepository, TransactionFilter, TransactionRepository,
};

// =============================================================================
// In-memory repositories
// =============================================================================

#[derive(Default)]
struct InMemoryPlans {
    plans: Mutex<Vec<SubscriptionPlan>>,
}

#[async_trait]
impl PlanRepository for InMemoryPlans {
    async fn create(&self, plan: &SubscriptionPlan) -> Result<(), BillingError> {
        let mut plans = self.plans.lock().unwrap();
        if plans.iter().any(|p| p.title == plan.title) {
            return Err(BillingError::already_exists("plan", plan.title.clone()));
        }
        plans.push(plan.clone());
        Ok(())
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), BillingError> {
        let mut plans = self.plans.lock().unwrap();
        match plans.iter_mut().find(|p| p.id == plan.id) {
            Some(stored) => {
                *stored = plan.clone();
                Ok(())
            }
            None => Err(BillingError::not_found("plan", plan.id)),
        }
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, BillingError> {
        Ok(self.plans.lock().unwrap().iter().find(|p| &p.id == id).cloned())
    }

    async fn find_by_title(
        &self,
        title: &str,
    ) -> Result<Option<SubscriptionPlan>, BillingError> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.title == title)
            .cloned())
    }

    async fn list(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, BillingError> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.is_archive.map_or(true, |a| p.is_archive == a))
            .cloned()
            .collect())
    }

    async fn delete(&self, _id: &PlanId) -> Result<(), BillingError> {
        Ok(())
    }
}

#[derive(Default)]
struct InMemorySubscriptions {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptions {
    fn all(&self) -> Vec<Subscription> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Test hook simulating time passing.
    fn force_end_date(&self, id: SubscriptionId, end_date: Timestamp) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(subscription) = subscriptions.iter_mut().find(|s| s.id == id) {
            subscription.end_date = end_date;
        }
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptions {
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
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .cloned()
            .collect())
    }

    async fn delete(&self, _id: &SubscriptionId) -> Result<(), BillingError> {
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryTransactions {
    transactions: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactions {
    fn all(&self) -> Vec<Transaction> {
        self.transactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactions {
    async fn create(&self, transaction: &Transaction) -> Result<(), BillingError> {
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(())
    }

    async fn update(&self, transaction: &Transaction) -> Result<(), BillingError> {
        let mut transactions = self.transactions.lock().unwrap();
        if let Some(intent_id) = &transaction.gateway_intent_id {
            if transactions
                .iter()
                .any(|t| t.id != transaction.id && t.gateway_intent_id.as_ref() == Some(intent_id))
            {
                return Err(BillingError::already_exists("transaction", intent_id.clone()));
            }
        }
        match transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(stored) => {
                *stored = transaction.clone();
                Ok(())
            }
            None => Err(BillingError::not_found("transaction", transaction.id)),
        }
    }

    async fn find_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, BillingError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| &t.id == id)
            .cloned())
    }

    async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, BillingError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.gateway_intent_id.as_deref() == Some(intent_id))
            .cloned())
    }

    async fn find_latest_pending_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Transaction>, BillingError> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions
            .iter()
            .filter(|t| {
                &t.subscription_id == subscription_id && t.status == TransactionStatus::Pending
            })
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn list(&self, filter: TransactionFilter) -> Result<Vec<Transaction>, BillingError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| filter.user_id.map_or(true, |u| t.user_id == u))
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect())
    }

    async fn delete(&self, _id: &TransactionId) -> Result<(), BillingError> {
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryCards {
    cards: Mutex<Vec<UserCard>>,
}

impl InMemoryCards {
    fn all(&self) -> Vec<UserCard> {
        self.cards.lock().unwrap().clone()
    }
}

#[async_trait]
impl CardRepository for InMemoryCards {
    async fn create(&self, card: &UserCard) -> Result<(), BillingError> {
        self.cards.lock().unwrap().push(card.clone());
        Ok(())
    }

    async fn update(&self, card: &UserCard) -> Result<(), BillingError> {
        let mut cards = self.cards.lock().unwrap();
        match cards.iter_mut().find(|c| c.id == card.id) {
            Some(stored) => {
                *stored = card.clone();
                Ok(())
            }
            None => Err(BillingError::not_found("card", card.id)),
        }
    }

    async fn update_as_default(&self, card: &UserCard) -> Result<(), BillingError> {
        let mut cards = self.cards.lock().unwrap();
        for other in cards
            .iter_mut()
            .filter(|c| c.user_id == card.user_id && c.id != card.id)
        {
            other.is_default = false;
        }
        match cards.iter_mut().find(|c| c.id == card.id) {
            Some(stored) => {
                *stored = card.clone();
                Ok(())
            }
            None => Err(BillingError::not_found("card", card.id)),
        }
    }

    async fn set_exclusive_default(
        &self,
        user_id: &UserId,
        card_id: &CardId,
    ) -> Result<(), BillingError> {
        let mut cards = self.cards.lock().unwrap();
        for card in cards
            .iter_mut()
            .filter(|c| &c.user_id == user_id && c.status == CardStatus::Success)
        {
            card.is_default = &card.id == card_id;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &CardId) -> Result<Option<UserCard>, BillingError> {
        Ok(self.cards.lock().unwrap().iter().find(|c| &c.id == id).cloned())
    }

    async fn find_any_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserCard>, BillingError> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.user_id == user_id)
            .cloned())
    }

    async fn find_latest_init_by_customer(
        &self,
        gateway_customer_id: &str,
    ) -> Result<Option<UserCard>, BillingError> {
        let cards = self.cards.lock().unwrap();
        Ok(cards
            .iter()
            .filter(|c| {
                c.gateway_customer_id == gateway_customer_id && c.status == CardStatus::Init
            })
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn find_default_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserCard>, BillingError> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.user_id == user_id && c.status == CardStatus::Success && c.is_default)
            .cloned())
    }

    async fn list_success_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserCard>, BillingError> {
        let mut cards: Vec<UserCard> = self
            .cards
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.user_id == user_id && c.status == CardStatus::Success)
            .cloned()
            .collect();
        cards.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        Ok(cards)
    }

    async fn delete(&self, id: &CardId) -> Result<(), BillingError> {
        self.cards.lock().unwrap().retain(|c| &c.id != id);
        Ok(())
    }
}

// =============================================================================
// Recording publishers
// =============================================================================

#[derive(Default)]
struct RecordingPublishers {
    auth_events: Mutex<Vec<AuthEvent>>,
    notifications: Mutex<Vec<NotificationEvent>>,
}

impl RecordingPublishers {
    fn auth_events(&self) -> Vec<AuthEvent> {
        self.auth_events.lock().unwrap().clone()
    }

    fn notifications(&self) -> Vec<NotificationEvent> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthEventPublisher for RecordingPublishers {
    async fn publish_role_change(&self, event: AuthEvent) -> Result<(), BillingError> {
        self.auth_events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublishers {
    async fn notify(&self, event: NotificationEvent) -> Result<(), BillingError> {
        self.notifications.lock().unwrap().push(event);
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    plans: Arc<PlanService>,
    subscriptions: Arc<InMemorySubscriptions>,
    transactions: Arc<InMemoryTransactions>,
    cards: Arc<InMemoryCards>,
    publishers: Arc<RecordingPublishers>,
    cards_manager: Arc<CardsManager>,
    manager: Arc<SubscriptionManager>,
    router: WebhookRouter,
    sweeper: ExpirySweeper,
}

fn harness() -> Harness {
    let plan_repo = Arc::new(InMemoryPlans::default());
    let subscription_repo = Arc::new(InMemorySubscriptions::default());
    let transaction_repo = Arc::new(InMemoryTransactions::default());
    let card_repo = Arc::new(InMemoryCards::default());
    let publishers = Arc::new(RecordingPublishers::default());
    let processor = Arc::new(MockPaymentProcessor::new());

    let plans = Arc::new(PlanService::new(plan_repo.clone()));
    let subscription_service = Arc::new(SubscriptionService::new(
        subscription_repo.clone(),
        plan_repo,
    ));
    let transaction_service = Arc::new(TransactionService::new(transaction_repo.clone()));

    let payments = Arc::new(PaymentManager::new(
        transaction_service,
        card_repo.clone(),
        processor.clone(),
    ));
    let cards_manager = Arc::new(CardsManager::new(
        card_repo.clone(),
        processor,
        publishers.clone(),
    ));
    let manager = Arc::new(SubscriptionManager::new(
        subscription_service,
        plans.clone(),
        payments,
        card_repo.clone(),
        publishers.clone(),
        publishers.clone(),
    ));
    let router = WebhookRouter::new(cards_manager.clone(), manager.clone());
    let sweeper = ExpirySweeper::new(
        subscription_repo.clone(),
        manager.clone(),
        std::time::Duration::from_secs(60),
    );

    Harness {
        plans,
        subscriptions: subscription_repo,
        transactions: transaction_repo,
        cards: card_repo,
        publishers,
        cards_manager,
        manager,
        router,
        sweeper,
    }
}

impl Harness {
    async fn create_plan(&self, title: &str, price: i64, duration_days: i32) -> SubscriptionPlan {
        self.plans
            .create(title, "integration plan", price, duration_days)
            .await
            .unwrap()
    }

    /// Bind a card by driving the gateway callbacks through the router.
    async fn bind_card(&self, user_id: UserId) -> UserCard {
        self.cards_manager.create_user_card(user_id).await.unwrap();
        let customer = self
            .cards
            .all()
            .into_iter()
            .find(|c| c.user_id == user_id && c.status == CardStatus::Init)
            .unwrap()
            .gateway_customer_id;

        self.router
            .dispatch(
                "payment_method.attached",
                &json!({"object": {"customer": customer, "card": {"last4": "4242"}}}),
            )
            .await;
        self.router
            .dispatch(
                "setup_intent.succeeded",
                &json!({
                    "object": {
                        "customer": customer,
                        "payment_method": format!("pm_{}", CardId::new()),
                    }
                }),
            )
            .await;

        self.cards
            .all()
            .into_iter()
            .find(|c| c.user_id == user_id && c.is_default)
            .expect("binding should produce a default card")
    }

    async fn deliver_intent_event(&self, event_type: &str, intent_id: &str) {
        self.router
            .dispatch(event_type, &json!({"object": {"id": intent_id}}))
            .await;
    }

    fn subscriber_upgrades(&self) -> usize {
        self.publishers
            .auth_events()
            .iter()
            .filter(|e| e.role == UserRole::Subscriber)
            .count()
    }

    fn basic_downgrades(&self) -> usize {
        self.publishers
            .auth_events()
            .iter()
            .filter(|e| e.role == UserRole::BasicUser)
            .count()
    }

    fn subscription_notifications(&self, status: &str) -> usize {
        self.publishers
            .notifications()
            .iter()
            .filter(|n| n.notification_data.status == status)
            .count()
    }
}

// =============================================================================
// Scenarios
// =============================================================================

/// Happy path: subscribe, pay, webhook activates, role upgraded.
#[tokio::test]
async fn subscribe_and_activate() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(subscription.status, SubscriptionStatus::Pending);
    assert_eq!(h.subscription_notifications("pending"), 1);

    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.amount, 1000);
    let intent_id = transaction.gateway_intent_id.unwrap();

    h.deliver_intent_event("payment_intent.succeeded", &intent_id)
        .await;

    let transactions = h.transactions.all();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, TransactionStatus::Success);

    let subscriptions = h.subscriptions.all();
    assert_eq!(subscriptions[0].status, SubscriptionStatus::Active);

    assert_eq!(h.subscriber_upgrades(), 1);
    assert_eq!(h.subscription_notifications("active"), 1);
}

/// A second subscription is rejected while one is live.
#[tokio::test]
async fn duplicate_subscribe_rejected() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let data = CreateSubscription {
        plan_id: plan.id,
        auto_renewal: false,
    };

    h.manager.create_subscription(user, data.clone()).await.unwrap();

    let result = h.manager.create_subscription(user, data).await;
    assert!(matches!(
        result,
        Err(BillingError::ActiveSubscriptionExists(_))
    ));
}

/// Binding a second card moves the default; deleting it moves it back.
#[tokio::test]
async fn card_default_invariant() {
    let h = harness();
    let user = UserId::new();

    let first = h.bind_card(user).await;
    let second = h.bind_card(user).await;

    let cards = h.cards.all();
    assert!(!cards.iter().find(|c| c.id == first.id).unwrap().is_default);
    assert!(cards.iter().find(|c| c.id == second.id).unwrap().is_default);

    h.cards_manager.delete_card(user, second.id).await.unwrap();

    let cards = h.cards.all();
    let defaults: Vec<_> = cards
        .iter()
        .filter(|c| c.status == CardStatus::Success && c.is_default)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, first.id);
}

/// Replaying the success webhook changes nothing and publishes nothing.
#[tokio::test]
async fn webhook_redelivery_is_idempotent() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: false,
            },
        )
        .await
        .unwrap();
    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    let intent_id = transaction.gateway_intent_id.unwrap();

    h.deliver_intent_event("payment_intent.succeeded", &intent_id)
        .await;
    let upgrades_after_first = h.subscriber_upgrades();
    let notifications_after_first = h.publishers.notifications().len();

    // Second delivery of the same event.
    h.deliver_intent_event("payment_intent.succeeded", &intent_id)
        .await;

    assert_eq!(h.transactions.all()[0].status, TransactionStatus::Success);
    assert_eq!(h.subscriptions.all()[0].status, SubscriptionStatus::Active);
    assert_eq!(h.subscriber_upgrades(), upgrades_after_first);
    assert_eq!(h.publishers.notifications().len(), notifications_after_first);
}

/// A failed payment notifies the user but leaves the subscription pending.
#[tokio::test]
async fn failed_payment_notifies_without_activation() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: false,
            },
        )
        .await
        .unwrap();
    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    let intent_id = transaction.gateway_intent_id.unwrap();

    h.deliver_intent_event("payment_intent.payment_failed", &intent_id)
        .await;

    assert_eq!(h.transactions.all()[0].status, TransactionStatus::Failed);
    assert_eq!(h.subscriptions.all()[0].status, SubscriptionStatus::Pending);
    assert_eq!(h.subscriber_upgrades(), 0);
    assert_eq!(
        h.publishers
            .notifications()
            .iter()
            .filter(|n| n.notification_data.status == "failed")
            .count(),
        1
    );
}

/// A refund cancels the active subscription and downgrades the role.
#[tokio::test]
async fn refund_cancels_subscription() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: false,
            },
        )
        .await
        .unwrap();
    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    let intent_id = transaction.gateway_intent_id.unwrap();

    h.deliver_intent_event("payment_intent.succeeded", &intent_id)
        .await;
    h.router
        .dispatch(
            "charge.refunded",
            &json!({"object": {"payment_intent": intent_id}}),
        )
        .await;

    assert_eq!(h.transactions.all()[0].status, TransactionStatus::Refunded);
    assert_eq!(
        h.subscriptions.all()[0].status,
        SubscriptionStatus::Cancelled
    );
    assert!(!h.subscriptions.all()[0].auto_renewal);
    assert_eq!(h.basic_downgrades(), 1);
}

/// Unknown gateway events are acknowledged without effect.
#[tokio::test]
async fn unknown_webhook_event_is_tolerated() {
    let h = harness();
    h.router
        .dispatch("invoice.created", &json!({"object": {"id": "in_1"}}))
        .await;
    assert!(h.publishers.notifications().is_empty());
    assert!(h.transactions.all().is_empty());
}

/// Expired subscription with auto-renewal: a fresh pending subscription
/// appears, the old one expires with no downgrade, one live row remains.
#[tokio::test]
async fn sweep_renews_opted_in_subscription() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: true,
            },
        )
        .await
        .unwrap();
    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    h.deliver_intent_event(
        "payment_intent.succeeded",
        &transaction.gateway_intent_id.unwrap(),
    )
    .await;

    // The term ends one second ago.
    h.subscriptions
        .force_end_date(subscription.id, Timestamp::now().add_secs(-1));

    h.sweeper.sweep_once().await.unwrap();

    let subscriptions = h.subscriptions.all();
    let old = subscriptions
        .iter()
        .find(|s| s.id == subscription.id)
        .unwrap();
    assert_eq!(old.status, SubscriptionStatus::Expired);
    assert!(!old.auto_renewal);

    let live: Vec<_> = subscriptions.iter().filter(|s| s.status.is_live()).collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].status, SubscriptionStatus::Pending);
    assert!(live[0].auto_renewal);
    assert_ne!(live[0].id, subscription.id);

    // Renewal keeps the user subscribed: no downgrade was published.
    assert_eq!(h.basic_downgrades(), 0);

    // The renewal charge was initiated against the default card.
    let renewal_charges: Vec<_> = h
        .transactions
        .all()
        .into_iter()
        .filter(|t| t.subscription_id == live[0].id)
        .collect();
    assert_eq!(renewal_charges.len(), 1);
    assert_eq!(renewal_charges[0].status, TransactionStatus::Pending);
}

/// Expired subscription without auto-renewal: expired plus downgrade.
#[tokio::test]
async fn sweep_expires_opted_out_subscription() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: false,
            },
        )
        .await
        .unwrap();
    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    h.deliver_intent_event(
        "payment_intent.succeeded",
        &transaction.gateway_intent_id.unwrap(),
    )
    .await;

    h.subscriptions
        .force_end_date(subscription.id, Timestamp::now().add_secs(-1));

    h.sweeper.sweep_once().await.unwrap();

    let subscriptions = h.subscriptions.all();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].status, SubscriptionStatus::Expired);
    assert_eq!(h.basic_downgrades(), 1);
    assert_eq!(h.subscription_notifications("expired"), 1);
}

/// Sweeping twice does not double-fire anything.
#[tokio::test]
async fn sweep_is_idempotent() {
    let h = harness();
    let plan = h.create_plan("Monthly", 1000, 30).await;
    let user = UserId::new();
    let card = h.bind_card(user).await;

    let subscription = h
        .manager
        .create_subscription(
            user,
            CreateSubscription {
                plan_id: plan.id,
                auto_renewal: false,
            },
        )
        .await
        .unwrap();
    let transaction = h
        .manager
        .initiate_payment(user, card.id, subscription.id)
        .await
        .unwrap();
    h.deliver_intent_event(
        "payment_intent.succeeded",
        &transaction.gateway_intent_id.unwrap(),
    )
    .await;
    h.subscriptions
        .force_end_date(subscription.id, Timestamp::now().add_secs(-1));

    h.sweeper.sweep_once().await.unwrap();
    h.sweeper.sweep_once().await.unwrap();

    assert_eq!(h.basic_downgrades(), 1);
    assert_eq!(h.subscription_notifications("expired"), 1);
}
