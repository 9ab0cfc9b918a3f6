//! Gateway webhook endpoint.

mod handlers;

use axum::routing::post;
use axum::Router;

use super::BillingAppState;
use handlers::payment_webhook;

/// Webhook routes, mounted without authentication.
///
/// - `POST /payment` - gateway event ingestion; always 200
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/payment", post(payment_webhook))
}
