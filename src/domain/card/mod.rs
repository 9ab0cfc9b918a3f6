//! Bound payment cards and the binding state machine.
//!
//! A card row is created in `Init` when the user opens a binding session at
//! the gateway; multi-event gateway callbacks then drive it to `Success` or
//! `Fail`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BillingError, CardId, StateMachine, Timestamp, UserId};

/// Binding status of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Binding session opened, waiting for gateway callbacks.
    Init,

    /// Token captured; the card is usable for charges.
    Success,

    /// Binding failed at the gateway. Terminal.
    Fail,
}

impl StateMachine for CardStatus {
    const ENTITY: &'static str = "user_card";

    fn can_transition_to(&self, target: &Self) -> bool {
        use CardStatus::*;
        matches!((self, target), (Init, Success) | (Init, Fail))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CardStatus::*;
        match self {
            Init => vec![Success, Fail],
            Success => vec![],
            Fail => vec![],
        }
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CardStatus::Init => "init",
            CardStatus::Success => "success",
            CardStatus::Fail => "fail",
        };
        write!(f, "{}", s)
    }
}

/// A payment card bound (or being bound) at the gateway.
///
/// # Invariants
///
/// - Per user, at most one card has `status == Success && is_default`
/// - All of a user's cards share one `gateway_customer_id`; the first card
///   allocates it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCard {
    /// Unique identifier for this card.
    pub id: CardId,

    /// Owning user.
    pub user_id: UserId,

    /// Gateway customer the card is vaulted under.
    pub gateway_customer_id: String,

    /// Reusable charge token, present once binding succeeded.
    pub payment_method_token: Option<String>,

    /// Binding status.
    pub status: CardStatus,

    /// Last four digits, captured from the attach callback.
    pub last_digits: Option<String>,

    /// Whether this is the card picked automatically for charges.
    pub is_default: bool,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last updated.
    pub updated_at: Timestamp,
}

impl UserCard {
    /// Create a card row in `Init` for a freshly opened binding session.
    pub fn new_binding(user_id: UserId, gateway_customer_id: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: CardId::new(),
            user_id,
            gateway_customer_id: gateway_customer_id.into(),
            payment_method_token: None,
            status: CardStatus::Init,
            last_digits: None,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the last four digits from the attach callback.
    pub fn record_last_digits(&mut self, last4: impl Into<String>) {
        self.last_digits = Some(last4.into());
        self.updated_at = Timestamp::now();
    }

    /// Finish binding successfully: capture the token and become the
    /// user's default card.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the card is in `Init`.
    pub fn bind_succeeded(&mut self, token: impl Into<String>) -> Result<(), BillingError> {
        self.status = self.status.transition_to(CardStatus::Success)?;
        self.payment_method_token = Some(token.into());
        self.is_default = true;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Mark the binding attempt as failed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the card is in `Init`.
    pub fn bind_failed(&mut self) -> Result<(), BillingError> {
        self.status = self.status.transition_to(CardStatus::Fail)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Make this card the default.
    pub fn set_default(&mut self) {
        self.is_default = true;
        self.updated_at = Timestamp::now();
    }

    /// Clear the default flag.
    pub fn clear_default(&mut self) {
        self.is_default = false;
        self.updated_at = Timestamp::now();
    }

    /// Whether this card can be charged.
    pub fn is_chargeable(&self) -> bool {
        self.status == CardStatus::Success && self.payment_method_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_card() -> UserCard {
        UserCard::new_binding(UserId::new(), "cus_123")
    }

    #[test]
    fn new_binding_starts_init_non_default() {
        let card = init_card();
        assert_eq!(card.status, CardStatus::Init);
        assert!(!card.is_default);
        assert!(card.payment_method_token.is_none());
        assert!(!card.is_chargeable());
    }

    #[test]
    fn bind_succeeded_captures_token_and_default() {
        let mut card = init_card();
        card.record_last_digits("4242");
        card.bind_succeeded("pm_abc").unwrap();
        assert_eq!(card.status, CardStatus::Success);
        assert!(card.is_default);
        assert_eq!(card.payment_method_token.as_deref(), Some("pm_abc"));
        assert_eq!(card.last_digits.as_deref(), Some("4242"));
        assert!(card.is_chargeable());
    }

    #[test]
    fn bind_failed_is_terminal() {
        let mut card = init_card();
        card.bind_failed().unwrap();
        assert_eq!(card.status, CardStatus::Fail);
        assert!(card.bind_succeeded("pm_late").is_err());
        assert!(CardStatus::Fail.is_terminal());
    }

    #[test]
    fn success_cannot_fail_afterwards() {
        let mut card = init_card();
        card.bind_succeeded("pm_abc").unwrap();
        assert!(card.bind_failed().is_err());
    }

    #[test]
    fn default_flag_toggles() {
        let mut card = init_card();
        card.bind_succeeded("pm_abc").unwrap();
        card.clear_default();
        assert!(!card.is_default);
        card.set_default();
        assert!(card.is_default);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&CardStatus::Init).unwrap(), "\"init\"");
    }
}
