//! Application layer - services, managers and background tasks.
//!
//! This layer orchestrates domain operations and coordinates between
//! ports: entity services own business rules, managers compose them with
//! the gateway and the broker, the webhook router feeds gateway events in,
//! and the sweeper advances subscriptions on a schedule.

pub mod managers;
pub mod services;
pub mod sweeper;
pub mod webhook_router;

pub use managers::{CardsManager, PaymentManager, SubscriptionManager};
pub use services::{
    ChangeStatusOutcome, CreateSubscription, PlanService, SettlementOutcome,
    SubscriptionService, TransactionService,
};
pub use sweeper::ExpirySweeper;
pub use webhook_router::WebhookRouter;
