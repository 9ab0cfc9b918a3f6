//! Access roles carried in JWT claims and auth-role-change events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role assigned to a user by the external auth service.
///
/// Billing upgrades users to `Subscriber` when a subscription activates and
/// downgrades them to `BasicUser` on cancellation or expiry. `Admin` is only
/// ever read from tokens, never published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    BasicUser,
    Subscriber,
}

impl UserRole {
    /// Check if this role grants admin access.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Admin => "admin",
            UserRole::BasicUser => "basic_user",
            UserRole::Subscriber => "subscriber",
        };
        write!(f, "{}", s)
    }
}
