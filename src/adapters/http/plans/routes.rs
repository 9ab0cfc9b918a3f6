//! Router for plan endpoints.

use axum::routing::get;
use axum::Router;

use super::super::BillingAppState;
use super::handlers::{create_plan, get_plan, list_plans, update_plan};

/// Plan API routes.
///
/// - `GET /` - paginated listing, archived plans hidden from non-admins
/// - `GET /{id}`
/// - `POST /` - admin only
/// - `PATCH /{id}` - admin only
pub fn plan_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/:plan_id", get(get_plan).patch(update_plan))
}
