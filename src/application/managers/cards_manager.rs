//! Card binding orchestration.
//!
//! Drives the INIT → SUCCESS|FAIL binding state machine from gateway
//! callbacks and maintains the default-card invariant.

use std::sync::Arc;

use crate::adapters::stripe::{
    PaymentMethodAttached, SetupIntentFailed, SetupIntentSucceeded,
};
use crate::domain::card::UserCard;
use crate::domain::events::NotificationEvent;
use crate::domain::foundation::{BillingError, CardId, UserId};
use crate::ports::{CardRepository, NotificationPublisher, PaymentProcessor};

/// Card binding state machine plus default-card maintenance.
pub struct CardsManager {
    cards: Arc<dyn CardRepository>,
    processor: Arc<dyn PaymentProcessor>,
    notifications: Arc<dyn NotificationPublisher>,
}

impl CardsManager {
    pub fn new(
        cards: Arc<dyn CardRepository>,
        processor: Arc<dyn PaymentProcessor>,
        notifications: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            cards,
            processor,
            notifications,
        }
    }

    /// Start binding a new card, returning the gateway session URL.
    ///
    /// The user's first card allocates the gateway customer; later cards
    /// reuse it.
    pub async fn create_user_card(&self, user_id: UserId) -> Result<String, BillingError> {
        let customer_id = match self.cards.find_any_for_user(&user_id).await? {
            Some(existing) => existing.gateway_customer_id,
            None => self.processor.create_customer().await?,
        };

        let card = UserCard::new_binding(user_id, customer_id.clone());
        self.cards.create(&card).await?;

        let url = self
            .processor
            .create_card_binding_session(&customer_id)
            .await?;

        tracing::info!(card_id = %card.id, user_id = %user_id, "card binding started");
        Ok(url)
    }

    /// `payment_method.attached`: remember the display digits on the
    /// in-flight binding.
    pub async fn handle_attached(
        &self,
        payload: PaymentMethodAttached,
    ) -> Result<(), BillingError> {
        match self
            .cards
            .find_latest_init_by_customer(&payload.customer)
            .await?
        {
            Some(mut card) => {
                card.record_last_digits(payload.last4);
                self.cards.update(&card).await
            }
            None => {
                tracing::warn!(
                    customer = payload.customer,
                    "attach callback without an in-flight binding, dropped"
                );
                Ok(())
            }
        }
    }

    /// `setup_intent.succeeded`: capture the token, promote the card to
    /// SUCCESS and make it the default (clearing the previous one
    /// atomically).
    pub async fn handle_setup_succeeded(
        &self,
        payload: SetupIntentSucceeded,
    ) -> Result<(), BillingError> {
        let Some(mut card) = self
            .cards
            .find_latest_init_by_customer(&payload.customer)
            .await?
        else {
            tracing::warn!(
                customer = payload.customer,
                "setup success without an in-flight binding, dropped"
            );
            return Ok(());
        };

        card.bind_succeeded(payload.payment_method)?;
        self.cards.update_as_default(&card).await?;

        if let Err(err) = self
            .notifications
            .notify(NotificationEvent::card_status(card.user_id, card.status))
            .await
        {
            tracing::warn!(error = %err, "card notification publish failed");
        }

        tracing::info!(card_id = %card.id, user_id = %card.user_id, "card bound");
        Ok(())
    }

    /// `setup_intent.setup_failed`: mark the in-flight binding FAIL.
    pub async fn handle_setup_failed(
        &self,
        payload: SetupIntentFailed,
    ) -> Result<(), BillingError> {
        let Some(mut card) = self
            .cards
            .find_latest_init_by_customer(&payload.customer)
            .await?
        else {
            tracing::warn!(
                customer = payload.customer,
                "setup failure without an in-flight binding, dropped"
            );
            return Ok(());
        };

        card.bind_failed()?;
        self.cards.update(&card).await?;

        if let Err(err) = self
            .notifications
            .notify(NotificationEvent::card_status(card.user_id, card.status))
            .await
        {
            tracing::warn!(error = %err, "card notification publish failed");
        }

        Ok(())
    }

    /// Make a bound card the user's default.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or unbound card, `AccessDenied` for a
    /// non-owner, `AlreadyDefault` when it already is.
    pub async fn set_default(
        &self,
        user_id: UserId,
        card_id: CardId,
    ) -> Result<(), BillingError> {
        let card = self.get_owned_success_card(user_id, card_id).await?;
        if card.is_default {
            return Err(BillingError::AlreadyDefault);
        }

        self.cards.set_exclusive_default(&user_id, &card_id).await
    }

    /// The user's bound cards.
    pub async fn list_user_cards(&self, user_id: UserId) -> Result<Vec<UserCard>, BillingError> {
        self.cards.list_success_for_user(&user_id).await
    }

    /// Detach a card at the gateway and delete it.
    ///
    /// If the deleted card was the default and other bound cards remain,
    /// the newest one is promoted.
    pub async fn delete_card(&self, user_id: UserId, card_id: CardId) -> Result<(), BillingError> {
        let card = self
            .cards
            .find_by_id(&card_id)
            .await?
            .ok_or_else(|| BillingError::not_found("card", card_id))?;
        if card.user_id != user_id {
            return Err(BillingError::access_denied("card belongs to another user"));
        }

        if let Some(token) = &card.payment_method_token {
            self.processor.detach_card(token).await?;
        }

        self.cards.delete(&card_id).await?;

        if card.is_default {
            let remaining = self.cards.list_success_for_user(&user_id).await?;
            if let Some(newest) = remaining.first() {
                self.cards
                    .set_exclusive_default(&user_id, &newest.id)
                    .await?;
            }
        }

        tracing::info!(card_id = %card_id, user_id = %user_id, "card deleted");
        Ok(())
    }

    async fn get_owned_success_card(
        &self,
        user_id: UserId,
        card_id: CardId,
    ) -> Result<UserCard, BillingError> {
        let card = self
            .cards
            .find_by_id(&card_id)
            .await?
            .filter(|c| c.status == crate::domain::card::CardStatus::Success)
            .ok_or_else(|| BillingError::not_found("card", card_id))?;
        if card.user_id != user_id {
            return Err(BillingError::access_denied("card belongs to another user"));
        }
        Ok(card)
    }
}
