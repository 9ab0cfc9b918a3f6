//! HTTP implementation of the SidecarClient port.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{SidecarClient, WorkerError};

/// Header carrying the worker→sidecar shared secret.
const SECRET_HEADER: &str = "X-Service-Secret-Token";

/// Per-request timeout for sidecar calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers worker events to sidecars over HTTP.
pub struct HttpSidecarClient {
    http_client: reqwest::Client,
    secret_token: SecretString,
}

impl HttpSidecarClient {
    pub fn new(secret_token: SecretString) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Self {
            http_client,
            secret_token,
        }
    }
}

#[async_trait]
impl SidecarClient for HttpSidecarClient {
    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<(), WorkerError> {
        let response = self
            .http_client
            .post(url)
            .header(SECRET_HEADER, self.secret_token.expose_secret())
            .json(payload)
            .send()
            .await
            .map_err(|e| WorkerError::Temporary(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(url, %status, "sidecar delivery succeeded");
            return Ok(());
        }

        if status.is_client_error() {
            Err(WorkerError::Permanent(format!(
                "sidecar {} rejected request with status {}",
                url, status
            )))
        } else {
            Err(WorkerError::Temporary(format!(
                "sidecar {} failed with status {}",
                url, status
            )))
        }
    }
}
