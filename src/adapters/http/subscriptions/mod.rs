//! Subscription HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use routes::subscription_routes;
