//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `PlanRepository`, `SubscriptionRepository`, `TransactionRepository`,
//!   `CardRepository` - typed per-entity repositories
//!
//! ## Gateway Port
//!
//! - `PaymentProcessor` - customer creation, card binding, payment intents
//!
//! ## Broker Ports
//!
//! - `AuthEventPublisher`, `NotificationPublisher` - outbound events
//! - `SidecarClient` - worker-side delivery to HTTP sidecars
//!
//! ## Resilience
//!
//! - `CircuitBreaker` - per-worker protection against sidecar outages

mod card_repository;
mod circuit_breaker;
mod event_publisher;
mod payment_processor;
mod plan_repository;
mod sidecar_client;
mod subscription_repository;
mod transaction_repository;

pub use card_repository::CardRepository;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use event_publisher::{AuthEventPublisher, NotificationPublisher};
pub use payment_processor::{
    GatewayError, GatewayErrorKind, IntentMetadata, PaymentIntent, PaymentIntentRequest,
    PaymentProcessor,
};
pub use plan_repository::{PlanFilter, PlanRepository};
pub use sidecar_client::{SidecarClient, WorkerError};
pub use subscription_repository::{SubscriptionFilter, SubscriptionRepository};
pub use transaction_repository::{TransactionFilter, TransactionRepository};
