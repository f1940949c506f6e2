//! Push endpoint.
//!
//! Response bodies are fixed strings, byte-for-byte what platform-side
//! subscribers already expect from this device.

use crate::server::Bridge;
use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use lamp_core::{PushOutcome, RejectReason};
use std::sync::Arc;

/// Body sent with 200 for every accepted notification.
pub const ACCEPTED_BODY: &str = r#"{"status": "Data received"}"#;

/// Body sent with 400 when the envelope is not JSON.
pub const INVALID_JSON_BODY: &str = r#"{"error": "Invalid JSON"}"#;

/// Body sent with 400 when the envelope has no `con` field.
pub const MISSING_CON_BODY: &str = r#"{"error": "Missing 'con' field"}"#;

/// Map a push outcome to its status code and body.
pub fn response_for(outcome: &PushOutcome) -> (StatusCode, &'static str) {
    match outcome {
        PushOutcome::Accepted(_) => (StatusCode::OK, ACCEPTED_BODY),
        PushOutcome::Rejected(RejectReason::InvalidEnvelope) => {
            (StatusCode::BAD_REQUEST, INVALID_JSON_BODY)
        }
        PushOutcome::Rejected(RejectReason::MissingField) => {
            (StatusCode::BAD_REQUEST, MISSING_CON_BODY)
        }
    }
}

/// Notification handler.
pub async fn notify_handler(
    Extension(bridge): Extension<Arc<Bridge>>,
    body: Bytes,
) -> impl IntoResponse {
    let outcome = bridge.handle_notification(&body);
    let (status, body) = response_for(&outcome);
    (status, [(CONTENT_TYPE, "application/json")], body)
}
