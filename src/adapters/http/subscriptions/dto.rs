//! Request/response DTOs for subscription endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CardId, PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};

/// Subscription representation returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub auto_renewal: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            status: subscription.status,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            auto_renewal: subscription.auto_renewal,
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
        }
    }
}

/// Body of `POST /subscriptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan_id: PlanId,

    #[serde(default)]
    pub auto_renewal: bool,
}

/// Body of `POST /subscriptions/{id}/renew`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenewSubscriptionRequest {
    pub plan_id: PlanId,
}

/// Query of `POST /subscriptions/{id}/pay`.
#[derive(Debug, Clone, Deserialize)]
pub struct PayQuery {
    pub card_id: CardId,
}

/// Listing filters for `GET /subscriptions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionListQuery {
    pub plan_id: Option<PlanId>,
    pub status: Option<SubscriptionStatus>,

    /// Admin only: restrict to one user. Ignored for regular callers.
    pub user_id: Option<UserId>,
}
