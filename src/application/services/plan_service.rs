//! Subscription plan service.
//!
//! Business rules over the plan repository: title uniqueness and archival.

use std::sync::Arc;

use crate::domain::foundation::{BillingError, PlanId};
use crate::domain::plan::{PlanPatch, SubscriptionPlan};
use crate::ports::{PlanFilter, PlanRepository};

/// CRUD for subscription plans with title-uniqueness enforcement.
pub struct PlanService {
    repository: Arc<dyn PlanRepository>,
}

impl PlanService {
    pub fn new(repository: Arc<dyn PlanRepository>) -> Self {
        Self { repository }
    }

    /// Create a plan.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the title is taken, `Validation` for bad
    /// fields.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        price: i64,
        duration_days: i32,
    ) -> Result<SubscriptionPlan, BillingError> {
        if self.repository.find_by_title(title).await?.is_some() {
            return Err(BillingError::already_exists("plan", title));
        }

        let plan = SubscriptionPlan::new(title, description, price, duration_days)?;
        self.repository.create(&plan).await?;

        tracing::info!(plan_id = %plan.id, title, "plan created");
        Ok(plan)
    }

    /// Patch a plan.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing plan, `AlreadyExists` when renaming onto a
    /// title another plan holds.
    pub async fn update(
        &self,
        id: &PlanId,
        patch: PlanPatch,
    ) -> Result<SubscriptionPlan, BillingError> {
        let mut plan = self.get(id).await?;

        if let Some(new_title) = &patch.title {
            if new_title != &plan.title {
                if let Some(other) = self.repository.find_by_title(new_title).await? {
                    if other.id != plan.id {
                        return Err(BillingError::already_exists("plan", new_title.clone()));
                    }
                }
            }
        }

        plan.apply(patch)?;
        self.repository.update(&plan).await?;
        Ok(plan)
    }

    /// List plans. End-user queries filter `is_archive = false`; admin
    /// queries pass an empty filter.
    pub async fn list(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, BillingError> {
        self.repository.list(filter).await
    }

    /// Fetch one plan.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent.
    pub async fn get(&self, id: &PlanId) -> Result<SubscriptionPlan, BillingError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| BillingError::not_found("plan", id))
    }
}
