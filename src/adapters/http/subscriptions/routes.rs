//! Router for subscription endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::BillingAppState;
use super::handlers::{
    cancel_subscription, create_subscription, get_subscription, list_subscriptions,
    pay_subscription, renew_subscription, toggle_auto_renewal,
};

/// Subscription API routes.
///
/// - `GET /` - caller's subscriptions (admins see all)
/// - `GET /{id}`
/// - `POST /` - create (400 when a live subscription exists)
/// - `POST /{id}/pay?card_id=` - charge a chosen card
/// - `POST /{id}/cancel`
/// - `POST /{id}/renew`
/// - `POST /{id}/toggle_auto_renewal`
pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/", get(list_subscriptions).post(create_subscription))
        .route("/:subscription_id", get(get_subscription))
        .route("/:subscription_id/pay", post(pay_subscription))
        .route("/:subscription_id/cancel", post(cancel_subscription))
        .route("/:subscription_id/renew", post(renew_subscription))
        .route(
            "/:subscription_id/toggle_auto_renewal",
            post(toggle_auto_renewal),
        )
}
