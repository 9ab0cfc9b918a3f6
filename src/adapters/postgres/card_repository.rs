//! PostgreSQL implementation of CardRepository.
//!
//! The default-card invariant is maintained by running "clear the other
//! defaults" and "set this one" inside a single database transaction (or a
//! single statement where possible).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::card::{CardStatus, UserCard};
use crate::domain::foundation::{BillingError, CardId, Timestamp, UserId};
use crate::ports::CardRepository;

/// PostgreSQL implementation of the CardRepository port.
pub struct PostgresCardRepository {
    pool: PgPool,
}

impl PostgresCardRepository {
    /// Creates a new repository backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user card.
#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    user_id: Uuid,
    gateway_customer_id: String,
    payment_method_token: Option<String>,
    status: String,
    last_digits: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for UserCard {
    type Error = BillingError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        Ok(UserCard {
            id: CardId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            gateway_customer_id: row.gateway_customer_id,
            payment_method_token: row.payment_method_token,
            status: parse_status(&row.status)?,
            last_digits: row.last_digits,
            is_default: row.is_default,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<CardStatus, BillingError> {
    match s {
        "init" => Ok(CardStatus::Init),
        "success" => Ok(CardStatus::Success),
        "fail" => Ok(CardStatus::Fail),
        _ => Err(BillingError::database(format!(
            "invalid card status value: {}",
            s
        ))),
    }
}

fn status_to_string(status: &CardStatus) -> &'static str {
    match status {
        CardStatus::Init => "init",
        CardStatus::Success => "success",
        CardStatus::Fail => "fail",
    }
}

const SELECT_COLUMNS: &str = "id, user_id, gateway_customer_id, payment_method_token, status, \
                              last_digits, is_default, created_at, updated_at";

const UPDATE_STATEMENT: &str = r#"
    UPDATE user_cards SET
        payment_method_token = $2,
        status = $3,
        last_digits = $4,
        is_default = $5,
        updated_at = $6
    WHERE id = $1
"#;

#[async_trait]
impl CardRepository for PostgresCardRepository {
    async fn create(&self, card: &UserCard) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO user_cards (
                id, user_id, gateway_customer_id, payment_method_token, status,
                last_digits, is_default, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(card.id.as_uuid())
        .bind(card.user_id.as_uuid())
        .bind(&card.gateway_customer_id)
        .bind(&card.payment_method_token)
        .bind(status_to_string(&card.status))
        .bind(&card.last_digits)
        .bind(card.is_default)
        .bind(card.created_at.as_datetime())
        .bind(card.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to create card: {}", e)))?;

        Ok(())
    }

    async fn update(&self, card: &UserCard) -> Result<(), BillingError> {
        let result = sqlx::query(UPDATE_STATEMENT)
            .bind(card.id.as_uuid())
            .bind(&card.payment_method_token)
            .bind(status_to_string(&card.status))
            .bind(&card.last_digits)
            .bind(card.is_default)
            .bind(card.updated_at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| BillingError::database(format!("failed to update card: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("card", card.id));
        }

        Ok(())
    }

    async fn update_as_default(&self, card: &UserCard) -> Result<(), BillingError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BillingError::database(format!("failed to begin transaction: {}", e)))?;

        sqlx::query(
            "UPDATE user_cards SET is_default = FALSE, updated_at = $3 \
             WHERE user_id = $1 AND id <> $2 AND is_default",
        )
        .bind(card.user_id.as_uuid())
        .bind(card.id.as_uuid())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| BillingError::database(format!("failed to clear defaults: {}", e)))?;

        let result = sqlx::query(UPDATE_STATEMENT)
            .bind(card.id.as_uuid())
            .bind(&card.payment_method_token)
            .bind(status_to_string(&card.status))
            .bind(&card.last_digits)
            .bind(card.is_default)
            .bind(card.updated_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| BillingError::database(format!("failed to update card: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("card", card.id));
        }

        tx.commit()
            .await
            .map_err(|e| BillingError::database(format!("failed to commit: {}", e)))?;

        Ok(())
    }

    async fn set_exclusive_default(
        &self,
        user_id: &UserId,
        card_id: &CardId,
    ) -> Result<(), BillingError> {
        // One statement flips every success card of the user at once.
        let result = sqlx::query(
            "UPDATE user_cards SET is_default = (id = $2), updated_at = $3 \
             WHERE user_id = $1 AND status = 'success'",
        )
        .bind(user_id.as_uuid())
        .bind(card_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to set default card: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("card", card_id));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &CardId) -> Result<Option<UserCard>, BillingError> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_cards WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find card: {}", e)))?;

        row.map(UserCard::try_from).transpose()
    }

    async fn find_any_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserCard>, BillingError> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_cards WHERE user_id = $1 LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find card: {}", e)))?;

        row.map(UserCard::try_from).transpose()
    }

    async fn find_latest_init_by_customer(
        &self,
        gateway_customer_id: &str,
    ) -> Result<Option<UserCard>, BillingError> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM user_cards
            WHERE gateway_customer_id = $1 AND status = 'init'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(gateway_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find card: {}", e)))?;

        row.map(UserCard::try_from).transpose()
    }

    async fn find_default_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserCard>, BillingError> {
        let row: Option<CardRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM user_cards
            WHERE user_id = $1 AND status = 'success' AND is_default
            "#,
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find default card: {}", e)))?;

        row.map(UserCard::try_from).transpose()
    }

    async fn list_success_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserCard>, BillingError> {
        let rows: Vec<CardRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM user_cards
            WHERE user_id = $1 AND status = 'success'
            ORDER BY created_at DESC
            "#,
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to list cards: {}", e)))?;

        rows.into_iter().map(UserCard::try_from).collect()
    }

    async fn delete(&self, id: &CardId) -> Result<(), BillingError> {
        let result = sqlx::query("DELETE FROM user_cards WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| BillingError::database(format!("failed to delete card: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("card", id));
        }

        Ok(())
    }
}
