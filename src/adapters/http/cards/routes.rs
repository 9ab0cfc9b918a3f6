//! Router for card endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::super::BillingAppState;
use super::handlers::{create_checkout_session, delete_card, list_cards, set_default_card};

/// Card API routes.
///
/// - `POST /checkout-session` - 303 redirect to the gateway binding form
/// - `GET /` - bound cards
/// - `POST /set-default?card_id=`
/// - `DELETE /{id}`
pub fn card_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/", get(list_cards))
        .route("/checkout-session", post(create_checkout_session))
        .route("/set-default", post(set_default_card))
        .route("/:card_id", delete(delete_card))
}
