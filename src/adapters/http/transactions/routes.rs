//! Routers for transaction endpoints.

use axum::routing::get;
use axum::Router;

use super::super::BillingAppState;
use super::handlers::{
    admin_get_transaction, admin_list_transactions, get_transaction, list_transactions,
};

/// User-facing transaction routes.
///
/// - `GET /` - caller's transactions with filters
/// - `GET /{id}` - owner only
pub fn transaction_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/:transaction_id", get(get_transaction))
}

/// Admin transaction routes, mounted under `/admin/transactions`.
///
/// - `GET /` - any user's transactions
/// - `GET /{id}`
pub fn admin_transaction_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/", get(admin_list_transactions))
        .route("/:transaction_id", get(admin_get_transaction))
}
