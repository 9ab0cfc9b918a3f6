//! PlanRepository port.

use async_trait::async_trait;

use crate::domain::foundation::{BillingError, PlanId};
use crate::domain::plan::SubscriptionPlan;

/// Equality filters for plan listings. `None` fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    pub is_archive: Option<bool>,
}

/// Persistence port for subscription plans.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Insert a new plan.
    ///
    /// A duplicate title maps to `AlreadyExists`.
    async fn create(&self, plan: &SubscriptionPlan) -> Result<(), BillingError>;

    /// Persist changes to an existing plan.
    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), BillingError>;

    /// Fetch a plan by id.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, BillingError>;

    /// Fetch a plan by its unique title.
    async fn find_by_title(&self, title: &str)
        -> Result<Option<SubscriptionPlan>, BillingError>;

    /// List plans matching the filter.
    async fn list(&self, filter: PlanFilter) -> Result<Vec<SubscriptionPlan>, BillingError>;

    /// Hard-delete a plan row.
    async fn delete(&self, id: &PlanId) -> Result<(), BillingError>;
}
