//! Gateway webhook ingestion.
//!
//! No authentication and no signature verification: the gateway retries on
//! any non-2xx, so the endpoint acknowledges every recognized or
//! unrecognized event with `{"detail": "success"}` and leaves dispatch
//! outcomes to the logs. Known weakness, preserved deliberately.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use super::super::BillingAppState;

/// POST /api/v1/webhooks/payment - ingest one gateway event
pub async fn payment_webhook(
    State(state): State<BillingAppState>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let event_type = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match payload.get("data") {
        Some(data) => {
            state.webhook_router.dispatch(&event_type, data).await;
        }
        None => {
            tracing::warn!(event_type, "webhook without data section dropped");
        }
    }

    Json(json!({"detail": "success"}))
}
