//! Worker sidecar configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Sidecar endpoints the queue workers deliver to, loaded from
/// `AUTH_SERVICE_URL`, `NOTIFICATION_SERVICE_URL` and `SECRET_TOKEN`.
#[derive(Debug, Clone, Deserialize)]
pub struct SidecarConfig {
    /// Base URL of the auth service role endpoint
    pub auth_service_url: String,

    /// Base URL of the notification service
    pub notification_service_url: String,

    /// Shared secret sent as `X-Service-Secret-Token`
    pub secret_token: SecretString,
}

impl SidecarConfig {
    /// Auth service URL with any trailing slash removed.
    pub fn auth_base(&self) -> &str {
        self.auth_service_url.trim_end_matches('/')
    }

    /// Notification service URL with any trailing slash removed.
    pub fn notification_base(&self) -> &str {
        self.notification_service_url.trim_end_matches('/')
    }

    /// Validate sidecar configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.auth_service_url.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_SERVICE_URL"));
        }
        if self.notification_service_url.is_empty() {
            return Err(ValidationError::MissingRequired("NOTIFICATION_SERVICE_URL"));
        }
        if !self.auth_service_url.starts_with("http") {
            return Err(ValidationError::InvalidSidecarUrl("AUTH_SERVICE_URL"));
        }
        if !self.notification_service_url.starts_with("http") {
            return Err(ValidationError::InvalidSidecarUrl("NOTIFICATION_SERVICE_URL"));
        }
        if self.secret_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("SECRET_TOKEN"));
        }
        Ok(())
    }
}
