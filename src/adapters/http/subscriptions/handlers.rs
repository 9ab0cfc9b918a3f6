//! HTTP handlers for subscription endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::services::CreateSubscription;
use crate::domain::foundation::SubscriptionId;
use crate::ports::SubscriptionFilter;

use super::super::auth::AuthenticatedUser;
use super::super::error::ApiError;
use super::super::pagination::{paginate, PageParams};
use super::super::transactions::TransactionResponse;
use super::super::BillingAppState;
use super::dto::{
    CreateSubscriptionRequest, PayQuery, RenewSubscriptionRequest, SubscriptionListQuery,
    SubscriptionResponse,
};

/// GET /api/v1/subscriptions - the caller's subscriptions (admins see all)
pub async fn list_subscriptions(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Query(page): Query<PageParams>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_filter = if user.is_admin() {
        query.user_id
    } else {
        Some(user.user_id)
    };

    let subscriptions = state
        .subscriptions
        .list(SubscriptionFilter {
            user_id: user_filter,
            plan_id: query.plan_id,
            status: query.status,
        })
        .await?;

    let responses: Vec<SubscriptionResponse> = subscriptions
        .into_iter()
        .map(SubscriptionResponse::from)
        .collect();
    Ok(Json(paginate(responses, &page)))
}

/// GET /api/v1/subscriptions/{id} - one subscription, owner or admin
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = if user.is_admin() {
        state.subscriptions.get_any(subscription_id).await?
    } else {
        state
            .subscriptions
            .get_owned(user.user_id, subscription_id)
            .await?
    };

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// POST /api/v1/subscriptions - create a pending subscription
pub async fn create_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .subscription_manager
        .create_subscription(
            user.user_id,
            CreateSubscription {
                plan_id: request.plan_id,
                auto_renewal: request.auto_renewal,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(subscription)),
    ))
}

/// POST /api/v1/subscriptions/{id}/pay - charge a chosen card
pub async fn pay_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<SubscriptionId>,
    Query(query): Query<PayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state
        .subscription_manager
        .initiate_payment(user.user_id, query.card_id, subscription_id)
        .await?;

    Ok(Json(TransactionResponse::from(transaction)))
}

/// POST /api/v1/subscriptions/{id}/cancel
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .subscription_manager
        .cancel_subscription(user.user_id, subscription_id)
        .await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// POST /api/v1/subscriptions/{id}/renew
pub async fn renew_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<SubscriptionId>,
    Json(request): Json<RenewSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .subscription_manager
        .renew_subscription(user.user_id, subscription_id, request.plan_id)
        .await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// POST /api/v1/subscriptions/{id}/toggle_auto_renewal
pub async fn toggle_auto_renewal(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .subscription_manager
        .toggle_auto_renewal(user.user_id, subscription_id)
        .await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}
