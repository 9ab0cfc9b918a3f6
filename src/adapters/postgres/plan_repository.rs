//! PostgreSQL implementation of PlanRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{BillingError, PlanId, Timestamp};
use crate::domain::plan::SubscriptionPlan;
use crate::ports::{PlanFilter, PlanRepository};

/// PostgreSQL implementation of the PlanRepository port.
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    /// Creates a new repository backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription plan.
#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    title: String,
    description: String,
    price: i64,
    duration_days: i32,
    is_archive: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(row: PlanRow) -> Self {
        SubscriptionPlan {
            id: PlanId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            price: row.price,
            duration_days: row.duration_days,
            is_archive: row.is_archive,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, title, description, price, duration_days, is_archive, created_at, updated_at";

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn create(&self, plan: &SubscriptionPlan) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_plans (
                id, title, description, price, duration_days, is_archive, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_days)
        .bind(plan.is_archive)
        .bind(plan.created_at.as_datetime())
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscription_plans_title_key") {
                    return BillingError::already_exists("plan", plan.title.clone());
                }
            }
            BillingError::database(format!("failed to create plan: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), BillingError> {
        let result = sqlx::query(
            r#"
            UPDATE subscription_plans SET
                title = $2,
                description = $3,
                price = $4,
                duration_days = $5,
                is_archive = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_days)
        .bind(plan.is_archive)
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscription_plans_title_key") {
                    return BillingError::already_exists("plan", plan.title.clone());
                }
            }
            BillingError::database(format!("failed to update plan: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("plan", plan.id));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, BillingError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscription_plans WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find plan: {}", e)))?;

        Ok(row.map(SubscriptionPlan::from))
    }

    async fn find_by_title(
        &self,
        title: &str,
    ) -> Result<Option<SubscriptionPlan>, BillingError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscription_plans WHERE title = $1",
            SELECT_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find plan: {}", e)))?;

        Ok(row.map(SubscriptionPlan::from))
    }

    async fn list(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, BillingError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscription_plans
            WHERE ($1::boolean IS NULL OR is_archive = $1)
            ORDER BY created_at ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(filter.is_archive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to list plans: {}", e)))?;

        Ok(rows.into_iter().map(SubscriptionPlan::from).collect())
    }

    async fn delete(&self, id: &PlanId) -> Result<(), BillingError> {
        let result = sqlx::query("DELETE FROM subscription_plans WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| BillingError::database(format!("failed to delete plan: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::not_found("plan", id));
        }

        Ok(())
    }
}
