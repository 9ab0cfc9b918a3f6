//! HTTP adapters - the REST surface over the managers.
//!
//! The handlers are thin: they authenticate, deserialize, call one
//! manager or service method and map the error taxonomy to status codes.
//! No business logic lives here.

mod auth;
mod cards;
mod error;
mod pagination;
mod plans;
mod subscriptions;
mod transactions;
mod webhooks;

pub use auth::{AccessTokenClaims, AdminUser, AuthenticatedUser, JwtVerifier};
pub use error::{ApiError, ErrorResponse};
pub use pagination::{paginate, Page, PageParams};

use std::sync::Arc;

use axum::Router;

use crate::application::{
    CardsManager, PlanService, SubscriptionManager, SubscriptionService, TransactionService,
    WebhookRouter,
};

/// Shared application state containing all handler dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct BillingAppState {
    pub plans: Arc<PlanService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub transactions: Arc<TransactionService>,
    pub cards_manager: Arc<CardsManager>,
    pub subscription_manager: Arc<SubscriptionManager>,
    pub webhook_router: Arc<WebhookRouter>,
    pub jwt: Arc<JwtVerifier>,
}

/// The complete API router, mounted at `/api/v1`.
pub fn api_router(state: BillingAppState) -> Router {
    Router::new()
        .nest("/api/v1/plans", plans::plan_routes())
        .nest("/api/v1/subscriptions", subscriptions::subscription_routes())
        .nest("/api/v1/transactions", transactions::transaction_routes())
        .nest(
            "/api/v1/admin/transactions",
            transactions::admin_transaction_routes(),
        )
        .nest("/api/v1/cards", cards::card_routes())
        .nest("/api/v1/webhooks", webhooks::webhook_routes())
        .with_state(state)
}
