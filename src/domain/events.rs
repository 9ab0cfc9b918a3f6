//! Events published to the broker for downstream sidecars.
//!
//! `AuthEvent` drives role changes in the auth service; `NotificationEvent`
//! fans user-facing notices out through the notification service. Both are
//! serialized to JSON and published persistently, routed by queue name.

use serde::{Deserialize, Serialize};

use crate::domain::card::CardStatus;
use crate::domain::foundation::{UserId, UserRole};
use crate::domain::subscription::SubscriptionStatus;
use crate::domain::transaction::TransactionStatus;

/// Queue names on the billing exchange.
pub const AUTH_QUEUE: &str = "auth_events";
pub const NOTIFICATION_QUEUE: &str = "notification_events";

/// Role-change request for the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub user_id: UserId,
    pub role: UserRole,
}

impl AuthEvent {
    /// Grant the subscriber role after activation.
    pub fn upgrade_to_subscriber(user_id: UserId) -> Self {
        Self {
            user_id,
            role: UserRole::Subscriber,
        }
    }

    /// Drop the user back to the basic role after cancellation or expiry.
    pub fn downgrade_to_basic(user_id: UserId) -> Self {
        Self {
            user_id,
            role: UserRole::BasicUser,
        }
    }
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTopic {
    Subscription,
    Card,
    Transaction,
}

/// Topic plus the status the entity moved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub topic: NotificationTopic,
    pub status: String,
}

/// User-facing notice for the notification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub user_id: UserId,
    pub notification_data: NotificationData,
}

impl NotificationEvent {
    /// Notify about a subscription status change.
    pub fn subscription_status(user_id: UserId, status: SubscriptionStatus) -> Self {
        Self {
            user_id,
            notification_data: NotificationData {
                topic: NotificationTopic::Subscription,
                status: status.to_string(),
            },
        }
    }

    /// Notify about a card binding status change.
    pub fn card_status(user_id: UserId, status: CardStatus) -> Self {
        Self {
            user_id,
            notification_data: NotificationData {
                topic: NotificationTopic::Card,
                status: status.to_string(),
            },
        }
    }

    /// Notify about a transaction status change.
    pub fn transaction_status(user_id: UserId, status: TransactionStatus) -> Self {
        Self {
            user_id,
            notification_data: NotificationData {
                topic: NotificationTopic::Transaction,
                status: status.to_string(),
            },
        }
    }
}
