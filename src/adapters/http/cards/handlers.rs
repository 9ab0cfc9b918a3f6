//! HTTP handlers for card endpoints.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;

use crate::domain::foundation::CardId;

use super::super::auth::AuthenticatedUser;
use super::super::error::ApiError;
use super::super::BillingAppState;
use super::dto::{CardResponse, DetailResponse, SetDefaultQuery};

/// POST /api/v1/cards/checkout-session - start binding a card
///
/// Responds with a 303 redirect to the gateway's binding form.
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let url = state.cards_manager.create_user_card(user.user_id).await?;
    Ok(Redirect::to(&url))
}

/// GET /api/v1/cards - the caller's bound cards
pub async fn list_cards(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let cards = state.cards_manager.list_user_cards(user.user_id).await?;
    let responses: Vec<CardResponse> = cards.into_iter().map(CardResponse::from).collect();
    Ok(Json(responses))
}

/// POST /api/v1/cards/set-default?card_id= - switch the default card
pub async fn set_default_card(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Query(query): Query<SetDefaultQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .cards_manager
        .set_default(user.user_id, query.card_id)
        .await?;
    Ok(Json(DetailResponse::success()))
}

/// DELETE /api/v1/cards/{id} - detach and delete a card
pub async fn delete_card(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Path(card_id): Path<CardId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .cards_manager
        .delete_card(user.user_id, card_id)
        .await?;
    Ok(Json(DetailResponse::success()))
}
