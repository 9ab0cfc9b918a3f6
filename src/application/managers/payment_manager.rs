//! Payment-intent orchestration.
//!
//! Glues transaction records to gateway payment intents and settles them
//! from webhook deliveries. Every webhook path is idempotent: a second
//! delivery finds the transaction already terminal and reports no change.

use std::sync::Arc;

use crate::adapters::stripe::{ChargeRefunded, EventMetadata, PaymentIntentEvent};
use crate::application::services::{SettlementOutcome, TransactionService};
use crate::domain::card::CardStatus;
use crate::domain::foundation::{BillingError, CardId, SubscriptionId, UserId};
use crate::domain::transaction::{PaymentType, Transaction, TransactionStatus};
use crate::ports::{CardRepository, IntentMetadata, PaymentIntentRequest, PaymentProcessor};

/// Payment-intent creation and webhook settlement.
pub struct PaymentManager {
    transactions: Arc<TransactionService>,
    cards: Arc<dyn CardRepository>,
    processor: Arc<dyn PaymentProcessor>,
}

impl PaymentManager {
    pub fn new(
        transactions: Arc<TransactionService>,
        cards: Arc<dyn CardRepository>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            transactions,
            cards,
            processor,
        }
    }

    /// Charge a bound card for a subscription.
    ///
    /// Creates a pending transaction, asks the gateway for an off-session
    /// intent and attaches the intent id. If the gateway refuses, the
    /// transaction is marked FAILED and `PaymentCreate` surfaces.
    pub async fn charge_subscription(
        &self,
        user_id: UserId,
        card_id: CardId,
        subscription_id: SubscriptionId,
        amount: i64,
        currency: &str,
    ) -> Result<Transaction, BillingError> {
        // 1. The card must belong to the caller and be chargeable.
        let card = self
            .cards
            .find_by_id(&card_id)
            .await?
            .ok_or_else(|| BillingError::not_found("card", card_id))?;
        if card.user_id != user_id {
            return Err(BillingError::access_denied("card belongs to another user"));
        }
        if card.status != CardStatus::Success {
            return Err(BillingError::validation("card_id", "card is not bound"));
        }
        let token = card.payment_method_token.clone().ok_or_else(|| {
            BillingError::validation("card_id", "card has no payment method token")
        })?;

        // 2. Record the attempt before touching the gateway.
        let transaction = self
            .transactions
            .create(
                subscription_id,
                user_id,
                amount,
                PaymentType::Stripe,
                card_id,
            )
            .await?;

        // 3. Intent carries reconciliation metadata; if the attach below is
        // lost to a crash, the webhook finds the row through it.
        let request = PaymentIntentRequest::new(
            amount,
            currency,
            &card.gateway_customer_id,
            IntentMetadata {
                subscription_id,
                user_id,
            },
        )?
        .with_payment_method(token)
        .with_description(format!("subscription {}", subscription_id));

        match self.processor.create_payment_intent(request).await {
            // 4. Remember which intent settles this transaction.
            Ok(intent) => {
                let transaction = self
                    .transactions
                    .attach_intent(transaction.id, &intent.intent_id)
                    .await?;
                tracing::info!(
                    transaction_id = %transaction.id,
                    intent_id = %intent.intent_id,
                    "payment intent created"
                );
                Ok(transaction)
            }
            // 5. Gateway refused: the attempt is dead.
            Err(err) => {
                tracing::warn!(
                    transaction_id = %transaction.id,
                    error = %err,
                    "payment intent creation failed"
                );
                self.transactions
                    .settle(transaction.id, TransactionStatus::Failed)
                    .await?;
                Err(err.into())
            }
        }
    }

    /// `payment_intent.succeeded`: settle the transaction SUCCESS.
    pub async fn handle_payment_succeeded(
        &self,
        event: &PaymentIntentEvent,
    ) -> Result<SettlementOutcome, BillingError> {
        let transaction = self.locate(&event.id, &event.metadata).await?;
        self.transactions
            .settle(transaction.id, TransactionStatus::Success)
            .await
    }

    /// `payment_intent.payment_failed`: settle the transaction FAILED.
    pub async fn handle_payment_failed(
        &self,
        event: &PaymentIntentEvent,
    ) -> Result<SettlementOutcome, BillingError> {
        let transaction = self.locate(&event.id, &event.metadata).await?;
        self.transactions
            .settle(transaction.id, TransactionStatus::Failed)
            .await
    }

    /// `charge.refunded`: settle the transaction REFUNDED.
    pub async fn handle_payment_refunded(
        &self,
        event: &ChargeRefunded,
    ) -> Result<SettlementOutcome, BillingError> {
        let transaction = self.locate(&event.payment_intent, &event.metadata).await?;
        self.transactions
            .settle(transaction.id, TransactionStatus::Refunded)
            .await
    }

    /// Find the transaction an intent settles.
    ///
    /// Normally the intent id was attached at creation. If that write was
    /// lost, the metadata's subscription id locates the newest pending
    /// transaction and the intent id is attached now.
    async fn locate(
        &self,
        intent_id: &str,
        metadata: &EventMetadata,
    ) -> Result<Transaction, BillingError> {
        if let Some(transaction) = self.transactions.find_by_intent_id(intent_id).await? {
            return Ok(transaction);
        }

        if let Some(subscription_id) = metadata.subscription_id {
            if let Some(orphan) = self
                .transactions
                .find_latest_pending_for_subscription(&subscription_id)
                .await?
            {
                tracing::warn!(
                    transaction_id = %orphan.id,
                    intent_id,
                    "reconciled intent onto pending transaction"
                );
                return self.transactions.attach_intent(orphan.id, intent_id).await;
            }
        }

        Err(BillingError::not_found("transaction", intent_id))
    }
}
