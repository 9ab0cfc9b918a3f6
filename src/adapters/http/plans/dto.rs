//! Request/response DTOs for plan endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Timestamp};
use crate::domain::plan::{PlanPatch, SubscriptionPlan};

/// Plan representation returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: PlanId,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub duration_days: i32,
    pub is_archive: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id,
            title: plan.title,
            description: plan.description,
            price: plan.price,
            duration_days: plan.duration_days,
            is_archive: plan.is_archive,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

/// Body of `POST /plans`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub duration_days: i32,
}

/// Body of `PATCH /plans/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlanRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_days: Option<i32>,
    pub is_archive: Option<bool>,
}

impl From<UpdatePlanRequest> for PlanPatch {
    fn from(request: UpdatePlanRequest) -> Self {
        PlanPatch {
            title: request.title,
            description: request.description,
            price: request.price,
            duration_days: request.duration_days,
            is_archive: request.is_archive,
        }
    }
}
