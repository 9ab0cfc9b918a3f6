//! PostgreSQL implementation of TransactionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    BillingError, CardId, SubscriptionId, Timestamp, TransactionId, UserId,
};
use crate::domain::transaction::{PaymentType, Transaction, TransactionStatus};
use crate::ports::{TransactionFilter, TransactionRepository};

/// PostgreSQL implementation of the TransactionRepository port.
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    /// Creates a new repository backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a transaction.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    subscription_id: Uuid,
    user_id: Uuid,
    amount: i64,
    payment_type: String,
    status: String,
    user_card_id: Uuid,
    gateway_intent_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = BillingError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: TransactionId::from_uuid(row.id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            user_id: UserId::from_uuid(row.user_id),
            amount: row.amount,
            payment_type: parse_payment_type(&row.payment_type)?,
            status: parse_status(&row.status)?,
            user_card_id: CardId::from_uuid(row.user_card_id),
            gateway_intent_id: row.gateway_intent_id,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<TransactionStatus, BillingError> {
    match s {
        "pending" => Ok(TransactionStatus::Pending),
        "success" => Ok(TransactionStatus::Success),
        "failed" => Ok(TransactionStatus::Failed),
        "refunded" => Ok(TransactionStatus::Refunded),
        _ => Err(BillingError::database(format!(
            "invalid transaction status value: {}",
            s
        ))),
    }
}

fn status_to_string(status: &TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Success => "success",
        TransactionStatus::Failed => "failed",
        TransactionStatus::Refunded => "refunded",
    }
}

fn parse_payment_type(s: &str) -> Result<PaymentType, BillingError> {
    match s {
        "stripe" => Ok(PaymentType::Stripe),
        "other" => Ok(PaymentType::Other),
        _ => Err(BillingError::database(format!(
            "invalid payment type value: {}",
            s
        ))),
    }
}

fn payment_type_to_string(payment_type: &PaymentType) -> &'static str {
    match payment_type {
        PaymentType::Stripe => "stripe",
        PaymentType::Other => "other",
    }
}

const SELECT_COLUMNS: &str = "id, subscription_id, user_id, amount, payment_type, status, \
                              user_card_id, gateway_intent_id, created_at, updated_at";

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, transaction: &Transaction) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, subscription_id, user_id, amount, payment_type, status,
                user_card_id, gateway_intent_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.subscription_id.as_uuid())
        .bind(transaction.user_id.as_uuid())
        .bind(transaction.amount)
        .bind(payment_type_to_string(&transaction.payment_type))
        .bind(status_to_string(&transaction.status))
        .bind(transaction.user_card_id.as_uuid())
        .bind(&transaction.gateway_intent_id)
        .bind(transaction.created_at.as_datetime())
        .bind(transaction.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to create transaction: {}", e)))?;

        Ok(())
    }

    async fn update(&self, transaction: &Transaction) -> Result<(), BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                status = $2,
                gateway_intent_id = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(status_to_string(&transaction.status))
        .bind(&transaction.gateway_intent_id)
        .bind(transaction.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("transactions_gateway_intent_id_key") {
                    return BillingError::already_exists(
                        "transaction",
                        format!(
                            "gateway intent {} is already attached",
                            transaction.gateway_intent_id.as_deref().unwrap_or("?")
                        ),
                    );
                }
            }
            BillingError::database(format!("failed to update transaction: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("transaction", transaction.id));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, BillingError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find transaction: {}", e)))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Transaction>, BillingError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE gateway_intent_id = $1",
            SELECT_COLUMNS
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find transaction: {}", e)))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn find_latest_pending_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Transaction>, BillingError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE subscription_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(subscription_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find transaction: {}", e)))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn list(&self, filter: TransactionFilter) -> Result<Vec<Transaction>, BillingError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR subscription_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::text IS NULL OR payment_type = $4)
            ORDER BY created_at DESC
            "#,
            SELECT_COLUMNS
        ))
        .bind(filter.user_id.map(|id| *id.as_uuid()))
        .bind(filter.subscription_id.map(|id| *id.as_uuid()))
        .bind(filter.status.map(|s| status_to_string(&s)))
        .bind(filter.payment_type.map(|t| payment_type_to_string(&t)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to list transactions: {}", e)))?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn delete(&self, id: &TransactionId) -> Result<(), BillingError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                BillingError::database(format!("failed to delete transaction: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("transaction", id));
        }

        Ok(())
    }
}
