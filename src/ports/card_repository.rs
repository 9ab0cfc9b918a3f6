//! CardRepository port.

use async_trait::async_trait;

use crate::domain::card::UserCard;
use crate::domain::foundation::{BillingError, CardId, UserId};

/// Persistence port for bound payment cards.
///
/// The default-card invariant (at most one SUCCESS card per user with
/// `is_default`) is maintained by the two atomic write operations below;
/// callers never juggle two separate updates.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Insert a new card row.
    async fn create(&self, card: &UserCard) -> Result<(), BillingError>;

    /// Persist changes to an existing card.
    async fn update(&self, card: &UserCard) -> Result<(), BillingError>;

    /// Persist the card and clear the default flag on every other card of
    /// the same user, in one transaction.
    ///
    /// Used when a binding succeeds and the new card takes over as default.
    async fn update_as_default(&self, card: &UserCard) -> Result<(), BillingError>;

    /// Make `card_id` the single default among the user's SUCCESS cards,
    /// in one statement.
    async fn set_exclusive_default(
        &self,
        user_id: &UserId,
        card_id: &CardId,
    ) -> Result<(), BillingError>;

    /// Fetch a card by id.
    async fn find_by_id(&self, id: &CardId) -> Result<Option<UserCard>, BillingError>;

    /// Any card of the user (used to reuse the gateway customer id).
    async fn find_any_for_user(&self, user_id: &UserId)
        -> Result<Option<UserCard>, BillingError>;

    /// Newest INIT card of a gateway customer.
    ///
    /// Gateway callbacks identify the in-flight binding this way.
    async fn find_latest_init_by_customer(
        &self,
        gateway_customer_id: &str,
    ) -> Result<Option<UserCard>, BillingError>;

    /// The user's default SUCCESS card, if any.
    async fn find_default_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserCard>, BillingError>;

    /// All SUCCESS cards of the user, newest first.
    async fn list_success_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserCard>, BillingError>;

    /// Hard-delete a card row.
    async fn delete(&self, id: &CardId) -> Result<(), BillingError>;
}
