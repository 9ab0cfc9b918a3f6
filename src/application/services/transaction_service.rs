//! Transaction service.
//!
//! Transaction CRUD and status updates keyed by the gateway intent id.

use std::sync::Arc;

use crate::domain::foundation::{BillingError, CardId, SubscriptionId, TransactionId, UserId};
use crate::domain::transaction::{PaymentType, Transaction, TransactionStatus};
use crate::ports::{TransactionFilter, TransactionRepository};

/// Result of a settlement attempt.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The transaction after the call.
    pub transaction: Transaction,

    /// False when the row was already in the requested status.
    pub changed: bool,
}

/// Transaction bookkeeping for the payment manager and the HTTP surface.
pub struct TransactionService {
    repository: Arc<dyn TransactionRepository>,
}

impl TransactionService {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// Record a pending charge attempt.
    pub async fn create(
        &self,
        subscription_id: SubscriptionId,
        user_id: UserId,
        amount: i64,
        payment_type: PaymentType,
        user_card_id: CardId,
    ) -> Result<Transaction, BillingError> {
        let transaction =
            Transaction::create(subscription_id, user_id, amount, payment_type, user_card_id);
        self.repository.create(&transaction).await?;
        Ok(transaction)
    }

    /// Attach the gateway intent id produced for a transaction.
    pub async fn attach_intent(
        &self,
        transaction_id: TransactionId,
        intent_id: &str,
    ) -> Result<Transaction, BillingError> {
        let mut transaction = self.get_any(transaction_id).await?;
        transaction.attach_intent(intent_id);
        self.repository.update(&transaction).await?;
        Ok(transaction)
    }

    /// Settle a transaction under the status legality table.
    ///
    /// A repeat of an already-applied settlement is a no-op reported
    /// through `changed`.
    pub async fn settle(
        &self,
        transaction_id: TransactionId,
        status: TransactionStatus,
    ) -> Result<SettlementOutcome, BillingError> {
        let mut transaction = self.get_any(transaction_id).await?;
        let changed = transaction.change_status(status)?;
        if changed {
            self.repository.update(&transaction).await?;
            tracing::info!(
                transaction_id = %transaction.id,
                status = %status,
                "transaction settled"
            );
        }
        Ok(SettlementOutcome {
            transaction,
            changed,
        })
    }

    /// Fetch a transaction by its gateway intent id.
    pub async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, BillingError> {
        self.repository.find_by_intent_id(intent_id).await
    }

    /// Newest pending transaction of a subscription (reconciliation path).
    pub async fn find_latest_pending_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Transaction>, BillingError> {
        self.repository
            .find_latest_pending_for_subscription(subscription_id)
            .await
    }

    /// Fetch the transaction if the user owns it.
    pub async fn get_owned(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, BillingError> {
        let transaction = self.get_any(transaction_id).await?;
        if transaction.user_id != user_id {
            return Err(BillingError::access_denied(
                "transaction belongs to another user",
            ));
        }
        Ok(transaction)
    }

    /// Fetch without an ownership check (admin and internal paths).
    pub async fn get_any(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Transaction, BillingError> {
        self.repository
            .find_by_id(&transaction_id)
            .await?
            .ok_or_else(|| BillingError::not_found("transaction", transaction_id))
    }

    /// List transactions matching the filter.
    pub async fn list(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, BillingError> {
        self.repository.list(filter).await
    }
}
