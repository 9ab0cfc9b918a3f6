//! HTTP handlers for plan endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::domain::foundation::PlanId;
use crate::ports::PlanFilter;

use super::super::auth::{AdminUser, AuthenticatedUser};
use super::super::error::ApiError;
use super::super::pagination::{paginate, PageParams};
use super::super::BillingAppState;
use super::dto::{CreatePlanRequest, PlanResponse, UpdatePlanRequest};

/// GET /api/v1/plans - list plans, archived ones hidden from non-admins
pub async fn list_plans(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = if user.is_admin() {
        PlanFilter::default()
    } else {
        PlanFilter {
            is_archive: Some(false),
        }
    };

    let plans = state.plans.list(filter).await?;
    let responses: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
    Ok(Json(paginate(responses, &page)))
}

/// GET /api/v1/plans/{id} - fetch one plan
pub async fn get_plan(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(plan_id): Path<PlanId>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.plans.get(&plan_id).await?;

    // Archived plans do not exist for end users.
    if plan.is_archive && !user.is_admin() {
        return Err(crate::domain::foundation::BillingError::not_found("plan", plan_id).into());
    }

    Ok(Json(PlanResponse::from(plan)))
}

/// POST /api/v1/plans - create a plan (admin)
pub async fn create_plan(
    State(state): State<BillingAppState>,
    _admin: AdminUser,
    Json(request): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .plans
        .create(
            &request.title,
            &request.description,
            request.price,
            request.duration_days,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// PATCH /api/v1/plans/{id} - update a plan (admin)
pub async fn update_plan(
    State(state): State<BillingAppState>,
    _admin: AdminUser,
    Path(plan_id): Path<PlanId>,
    Json(request): Json<UpdatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.plans.update(&plan_id, request.into()).await?;
    Ok(Json(PlanResponse::from(plan)))
}
