//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The one-live-subscription-per-user rule is enforced by the partial
//! unique index `ux_subscriptions_one_live_per_user`; the losing insert of
//! a create race surfaces as `ActiveSubscriptionExists`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{BillingError, PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new repository backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    auto_renewal: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = BillingError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            status: parse_status(&row.status)?,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            auto_renewal: row.auto_renewal,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, BillingError> {
    match s {
        "pending" => Ok(SubscriptionStatus::Pending),
        "active" => Ok(SubscriptionStatus::Active),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        "expired" => Ok(SubscriptionStatus::Expired),
        _ => Err(BillingError::database(format!(
            "invalid subscription status value: {}",
            s
        ))),
    }
}

fn status_to_string(status: &SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Pending => "pending",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Cancelled => "cancelled",
        SubscriptionStatus::Expired => "expired",
    }
}

const SELECT_COLUMNS: &str =
    "id, user_id, plan_id, status, start_date, end_date, auto_renewal, created_at, updated_at";

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, status, start_date, end_date, auto_renewal,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(subscription.plan_id.as_uuid())
        .bind(status_to_string(&subscription.status))
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.end_date.as_datetime())
        .bind(subscription.auto_renewal)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("ux_subscriptions_one_live_per_user") {
                    return BillingError::ActiveSubscriptionExists(subscription.user_id);
                }
            }
            BillingError::database(format!("failed to create subscription: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                start_date = $3,
                end_date = $4,
                auto_renewal = $5,
                updated_at = $6,
                version = version + 1
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(status_to_string(&subscription.status))
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.end_date.as_datetime())
        .bind(subscription.auto_renewal)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to update subscription: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("subscription", subscription.id));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, BillingError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_live_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, BillingError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE user_id = $1 AND status IN ('pending', 'active')
            "#,
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_expired_active(
        &self,
        now: Timestamp,
    ) -> Result<Vec<Subscription>, BillingError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE status = 'active' AND end_date <= $1
            ORDER BY end_date ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            BillingError::database(format!("failed to find expired subscriptions: {}", e))
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn list(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<Vec<Subscription>, BillingError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR plan_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
            SELECT_COLUMNS
        ))
        .bind(filter.user_id.map(|id| *id.as_uuid()))
        .bind(filter.plan_id.map(|id| *id.as_uuid()))
        .bind(filter.status.map(|s| status_to_string(&s)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to list subscriptions: {}", e)))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn delete(&self, id: &SubscriptionId) -> Result<(), BillingError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                BillingError::database(format!("failed to delete subscription: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("subscription", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_all_values() {
        assert_eq!(parse_status("pending").unwrap(), SubscriptionStatus::Pending);
        assert_eq!(parse_status("active").unwrap(), SubscriptionStatus::Active);
        assert_eq!(
            parse_status("cancelled").unwrap(),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(parse_status("expired").unwrap(), SubscriptionStatus::Expired);
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("paused").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            let s = status_to_string(&status);
            assert_eq!(parse_status(s).unwrap(), status);
        }
    }

    #[test]
    fn row_converts_to_entity() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status: "active".to_string(),
            start_date: now,
            end_date: now + chrono::Duration::days(30),
            auto_renewal: true,
            created_at: now,
            updated_at: now,
        };

        let subscription = Subscription::try_from(row).unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert!(subscription.auto_renewal);
        assert!(subscription.end_date.is_after(&subscription.start_date));
    }

    #[test]
    fn row_with_bad_status_fails() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status: "unknown".to_string(),
            start_date: now,
            end_date: now,
            auto_renewal: false,
            created_at: now,
            updated_at: now,
        };

        assert!(Subscription::try_from(row).is_err());
    }
}
