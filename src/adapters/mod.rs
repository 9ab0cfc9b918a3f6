//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum REST surface and JWT extractors
//! - `postgres` - sqlx repository implementations
//! - `rabbitmq` - broker topology, publisher and consumer loop
//! - `resilience` - circuit breaker implementation
//! - `stripe` - payment gateway implementation and webhook payloads
//! - `workers` - queue-worker framework and sidecar delivery

pub mod http;
pub mod postgres;
pub mod rabbitmq;
pub mod resilience;
pub mod stripe;
pub mod workers;

pub use http::{api_router, BillingAppState, JwtVerifier};
pub use postgres::{
    PostgresCardRepository, PostgresPlanRepository, PostgresSubscriptionRepository,
    PostgresTransactionRepository,
};
pub use rabbitmq::{run_consumer, RabbitEventPublisher};
pub use resilience::CountingCircuitBreaker;
pub use stripe::{GatewayEvent, MockPaymentProcessor, StripeConfig, StripeGateway};
pub use workers::{AuthWorker, HttpSidecarClient, NotificationWorker, WorkerProcessor};
