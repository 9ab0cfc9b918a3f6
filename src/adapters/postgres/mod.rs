//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! One adapter per entity, each mapping rows to domain entities and
//! database constraint violations to the matching business errors.

mod card_repository;
mod plan_repository;
mod subscription_repository;
mod transaction_repository;

pub use card_repository::PostgresCardRepository;
pub use plan_repository::PostgresPlanRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use transaction_repository::PostgresTransactionRepository;
