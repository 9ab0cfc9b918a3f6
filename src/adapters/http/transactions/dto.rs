//! Request/response DTOs for transaction endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CardId, SubscriptionId, Timestamp, TransactionId, UserId};
use crate::domain::transaction::{PaymentType, Transaction, TransactionStatus};

/// Transaction representation returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub amount: i64,
    pub payment_type: PaymentType,
    pub status: TransactionStatus,
    pub user_card_id: CardId,
    pub gateway_intent_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            subscription_id: transaction.subscription_id,
            user_id: transaction.user_id,
            amount: transaction.amount,
            payment_type: transaction.payment_type,
            status: transaction.status,
            user_card_id: transaction.user_card_id,
            gateway_intent_id: transaction.gateway_intent_id,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

/// Listing filters for transaction queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionListQuery {
    pub subscription_id: Option<SubscriptionId>,
    pub status: Option<TransactionStatus>,
    pub payment_type: Option<PaymentType>,

    /// Admin only: restrict to one user. Ignored for regular callers.
    pub user_id: Option<UserId>,
}
