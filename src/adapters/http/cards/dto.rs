//! Request/response DTOs for card endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::card::UserCard;
use crate::domain::foundation::CardId;

/// Bound-card representation returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CardResponse {
    pub id: CardId,
    pub last_digits: Option<String>,
    pub is_default: bool,
}

impl From<UserCard> for CardResponse {
    fn from(card: UserCard) -> Self {
        Self {
            id: card.id,
            last_digits: card.last_digits,
            is_default: card.is_default,
        }
    }
}

/// Query of `POST /cards/set-default`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetDefaultQuery {
    pub card_id: CardId,
}

/// Body acknowledging a card command.
#[derive(Debug, Clone, Serialize)]
pub struct DetailResponse {
    pub detail: &'static str,
}

impl DetailResponse {
    pub fn success() -> Self {
        Self { detail: "success" }
    }
}
