//! Stripe implementation of the PaymentProcessor port.
//!
//! Talks to the Stripe REST API with form-encoded requests. Responses are
//! classified per the port contract: 4xx is a permanent client error, 5xx
//! and transport failures are transient.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let gateway = StripeGateway::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{GatewayError, PaymentIntent, PaymentIntentRequest, PaymentProcessor};

/// Per-request timeout for gateway calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (`sk_live_...` or `sk_test_...`).
    api_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,

    /// Where the gateway redirects after a successful card binding.
    binding_success_url: String,

    /// Where the gateway redirects after an abandoned card binding.
    binding_cancel_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
            binding_success_url: "http://localhost/api/v1/cards/bind-success/".to_string(),
            binding_cancel_url: "http://localhost/api/v1/cards/checkout-session/".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the redirect URLs for card-binding sessions.
    pub fn with_binding_redirects(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.binding_success_url = success_url.into();
        self.binding_cancel_url = cancel_url.into();
        self
    }
}

/// Stripe gateway adapter.
pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

impl StripeGateway {
    /// Create a new gateway adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Self {
            config,
            http_client,
        }
    }

    /// POST a form-encoded request and decode the success body.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(path, error = %e, "gateway request failed to send");
                GatewayError::transient(format!("request to {} failed: {}", path, e))
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                GatewayError::transient(format!("undecodable gateway response: {}", e))
            });
        }

        // Pull Stripe's error message out of the body when present.
        let message = response
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or_else(|| format!("gateway returned status {}", status));

        if status.is_client_error() {
            tracing::warn!(path, %status, %message, "gateway rejected request");
            Err(GatewayError::permanent(message))
        } else {
            tracing::warn!(path, %status, %message, "gateway server error");
            Err(GatewayError::transient(message))
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeGateway {
    async fn create_customer(&self) -> Result<String, GatewayError> {
        let customer: IdObject = self.post_form("/v1/customers", &[]).await?;
        Ok(customer.id)
    }

    async fn create_card_binding_session(
        &self,
        customer_id: &str,
    ) -> Result<String, GatewayError> {
        let form = vec![
            ("mode".to_string(), "setup".to_string()),
            (
                "payment_method_types[]".to_string(),
                "card".to_string(),
            ),
            ("customer".to_string(), customer_id.to_string()),
            (
                "success_url".to_string(),
                self.config.binding_success_url.clone(),
            ),
            (
                "cancel_url".to_string(),
                self.config.binding_cancel_url.clone(),
            ),
        ];

        let session: CheckoutSessionObject =
            self.post_form("/v1/checkout/sessions", &form).await?;
        Ok(session.url)
    }

    async fn detach_card(&self, payment_method_token: &str) -> Result<(), GatewayError> {
        let path = format!("/v1/payment_methods/{}/detach", payment_method_token);
        let _detached: IdObject = self.post_form(&path, &[]).await?;
        Ok(())
    }

    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut form = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.clone()),
            ("customer".to_string(), request.customer_id.clone()),
            (
                "metadata[subscription_id]".to_string(),
                request.metadata.subscription_id.to_string(),
            ),
            (
                "metadata[user_id]".to_string(),
                request.metadata.user_id.to_string(),
            ),
        ];

        if let Some(description) = &request.description {
            form.push(("description".to_string(), description.clone()));
        }

        // A stored token means the charge happens without the user present.
        if let Some(token) = &request.payment_method_token {
            form.push(("payment_method".to_string(), token.clone()));
            form.push(("off_session".to_string(), "true".to_string()));
            form.push(("confirm".to_string(), "true".to_string()));
        }

        let intent: PaymentIntentObject = self.post_form("/v1/payment_intents", &form).await?;
        Ok(PaymentIntent {
            intent_id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<(), GatewayError> {
        let path = format!("/v1/payment_intents/{}/cancel", intent_id);
        let _cancelled: IdObject = self.post_form(&path, &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_stripe_api() {
        let config = StripeConfig::new(SecretString::new("sk_test_xxx".to_string()));
        assert_eq!(config.api_base_url, "https://api.stripe.com");
    }

    #[test]
    fn base_url_override_for_tests() {
        let config = StripeConfig::new(SecretString::new("sk_test_xxx".to_string()))
            .with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn binding_redirects_are_configurable() {
        let config = StripeConfig::new(SecretString::new("sk_test_xxx".to_string()))
            .with_binding_redirects("https://app/bind-ok", "https://app/bind-retry");
        assert_eq!(config.binding_success_url, "https://app/bind-ok");
        assert_eq!(config.binding_cancel_url, "https://app/bind-retry");
    }

    #[test]
    fn error_envelope_decodes_stripe_shape() {
        let body = r#"{"error": {"message": "No such customer"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message.as_deref(), Some("No such customer"));
    }
}
