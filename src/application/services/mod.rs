//! Entity services - business rules over the repositories.

mod plan_service;
mod subscription_service;
mod transaction_service;

pub use plan_service::PlanService;
pub use subscription_service::{ChangeStatusOutcome, CreateSubscription, SubscriptionService};
pub use transaction_service::{SettlementOutcome, TransactionService};
