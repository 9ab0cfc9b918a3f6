//! Subscription plan entity.
//!
//! Plans are created by admins, priced in the minor currency unit, and
//! soft-deleted via the archive flag so existing subscriptions keep a valid
//! reference.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BillingError, PlanId, Timestamp};

/// A purchasable subscription plan.
///
/// # Invariants
///
/// - `title` is unique across plans and non-empty
/// - `description` is non-empty
/// - `price >= 0` (minor currency unit)
/// - `duration_days > 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Unique identifier for this plan.
    pub id: PlanId,

    /// Display title, unique across all plans.
    pub title: String,

    /// Human-readable description.
    pub description: String,

    /// Price in the minor currency unit (e.g. cents).
    pub price: i64,

    /// Subscription length granted by one purchase.
    pub duration_days: i32,

    /// Soft-delete flag; archived plans are hidden from end users.
    pub is_archive: bool,

    /// When the plan was created.
    pub created_at: Timestamp,

    /// When the plan was last updated.
    pub updated_at: Timestamp,
}

/// Fields an admin may change on an existing plan. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct PlanPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_days: Option<i32>,
    pub is_archive: Option<bool>,
}

impl SubscriptionPlan {
    /// Create a new plan after validating its fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title/description, negative
    /// price or non-positive duration.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        price: i64,
        duration_days: i32,
    ) -> Result<Self, BillingError> {
        let title = title.into();
        let description = description.into();
        validate_fields(&title, &description, price, duration_days)?;

        let now = Timestamp::now();
        Ok(Self {
            id: PlanId::new(),
            title,
            description,
            price,
            duration_days,
            is_archive: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a patch, validating the resulting field values.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any patched value is invalid.
    pub fn apply(&mut self, patch: PlanPatch) -> Result<(), BillingError> {
        let title = patch.title.unwrap_or_else(|| self.title.clone());
        let description = patch
            .description
            .unwrap_or_else(|| self.description.clone());
        let price = patch.price.unwrap_or(self.price);
        let duration_days = patch.duration_days.unwrap_or(self.duration_days);
        validate_fields(&title, &description, price, duration_days)?;

        self.title = title;
        self.description = description;
        self.price = price;
        self.duration_days = duration_days;
        if let Some(is_archive) = patch.is_archive {
            self.is_archive = is_archive;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Soft-delete this plan.
    pub fn archive(&mut self) {
        self.is_archive = true;
        self.updated_at = Timestamp::now();
    }
}

fn validate_fields(
    title: &str,
    description: &str,
    price: i64,
    duration_days: i32,
) -> Result<(), BillingError> {
    if title.trim().is_empty() {
        return Err(BillingError::validation("title", "must not be empty"));
    }
    if description.trim().is_empty() {
        return Err(BillingError::validation("description", "must not be empty"));
    }
    if price < 0 {
        return Err(BillingError::validation("price", "must not be negative"));
    }
    if duration_days <= 0 {
        return Err(BillingError::validation(
            "duration_days",
            "must be positive",
        ));
    }
    Ok(())
}
