//! HTTP handlers for transaction endpoints.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::domain::foundation::TransactionId;
use crate::ports::TransactionFilter;

use super::super::auth::{AdminUser, AuthenticatedUser};
use super::super::error::ApiError;
use super::super::pagination::{paginate, PageParams};
use super::super::BillingAppState;
use super::dto::{TransactionListQuery, TransactionResponse};

/// GET /api/v1/transactions - the caller's transactions
pub async fn list_transactions(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Query(page): Query<PageParams>,
    Query(query): Query<TransactionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state
        .transactions
        .list(TransactionFilter {
            user_id: Some(user.user_id),
            subscription_id: query.subscription_id,
            status: query.status,
            payment_type: query.payment_type,
        })
        .await?;

    let responses: Vec<TransactionResponse> = transactions
        .into_iter()
        .map(TransactionResponse::from)
        .collect();
    Ok(Json(paginate(responses, &page)))
}

/// GET /api/v1/transactions/{id} - one transaction, owner only
pub async fn get_transaction(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state
        .transactions
        .get_owned(user.user_id, transaction_id)
        .await?;
    Ok(Json(TransactionResponse::from(transaction)))
}

/// GET /api/v1/admin/transactions - any user's transactions (admin)
pub async fn admin_list_transactions(
    State(state): State<BillingAppState>,
    _admin: AdminUser,
    Query(page): Query<PageParams>,
    Query(query): Query<TransactionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state
        .transactions
        .list(TransactionFilter {
            user_id: query.user_id,
            subscription_id: query.subscription_id,
            status: query.status,
            payment_type: query.payment_type,
        })
        .await?;

    let responses: Vec<TransactionResponse> = transactions
        .into_iter()
        .map(TransactionResponse::from)
        .collect();
    Ok(Json(paginate(responses, &page)))
}

/// GET /api/v1/admin/transactions/{id} - any transaction (admin)
pub async fn admin_get_transaction(
    State(state): State<BillingAppState>,
    _admin: AdminUser,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state.transactions.get_any(transaction_id).await?;
    Ok(Json(TransactionResponse::from(transaction)))
}
