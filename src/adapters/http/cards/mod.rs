//! Card HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use routes::card_routes;
