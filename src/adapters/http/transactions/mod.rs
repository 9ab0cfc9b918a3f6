//! Transaction HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::TransactionResponse;
pub use routes::{admin_transaction_routes, transaction_routes};
