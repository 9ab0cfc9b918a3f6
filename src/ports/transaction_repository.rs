//! TransactionRepository port.

use async_trait::async_trait;

use crate::domain::foundation::{BillingError, SubscriptionId, TransactionId, UserId};
use crate::domain::transaction::{PaymentType, Transaction, TransactionStatus};

/// Equality filters for transaction listings. `None` fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<UserId>,
    pub subscription_id: Option<SubscriptionId>,
    pub status: Option<TransactionStatus>,
    pub payment_type: Option<PaymentType>,
}

/// Persistence port for payment transactions.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert a new transaction.
    async fn create(&self, transaction: &Transaction) -> Result<(), BillingError>;

    /// Persist changes to an existing transaction.
    ///
    /// A duplicate `gateway_intent_id` maps to `AlreadyExists`.
    async fn update(&self, transaction: &Transaction) -> Result<(), BillingError>;

    /// Fetch a transaction by id.
    async fn find_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, BillingError>;

    /// Fetch the transaction holding this gateway intent id.
    async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, BillingError>;

    /// Newest pending transaction of a subscription.
    ///
    /// Reconciliation path: locates the row created before a crash that
    /// lost the intent-id attach.
    async fn find_latest_pending_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Transaction>, BillingError>;

    /// List transactions matching the filter.
    async fn list(&self, filter: TransactionFilter) -> Result<Vec<Transaction>, BillingError>;

    /// Hard-delete a transaction row.
    async fn delete(&self, id: &TransactionId) -> Result<(), BillingError>;
}
