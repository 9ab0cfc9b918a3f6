//! Mapping from the billing error taxonomy to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::foundation::BillingError;

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Wrapper turning `BillingError` into an HTTP response.
pub struct ApiError(pub BillingError);

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BillingError::AlreadyExists { .. }
            | BillingError::ActiveSubscriptionExists(_)
            | BillingError::SubscriptionCancel { .. }
            | BillingError::InvalidTransition { .. }
            | BillingError::AlreadyDefault => StatusCode::BAD_REQUEST,
            BillingError::AccessDenied(_) => StatusCode::FORBIDDEN,
            BillingError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::PaymentCreate { transient, .. } => {
                if *transient {
                    StatusCode::BAD_GATEWAY
                } else {
                    StatusCode::BAD_REQUEST
                }
            }
            BillingError::Database(_) | BillingError::Publish { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal details stay in the logs.
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}
