use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde_json::json;
use tracing::error;

use crate::errors::ServiceError;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Ingest a signed gateway webhook event.
///
/// The body is taken as raw bytes: the signature covers the exact payload as
/// sent, and parsing happens only after verification.
#[utoipa::path(
    post,
    path = "/api/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Invalid signature or payload")
    ),
    tag = "Webhooks"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    match state
        .reconciliation
        .ingest_webhook(&body, signature_header)
        .await
    {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(err @ (ServiceError::WebhookSignatureInvalid | ServiceError::BadRequest(_))) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "message": err.to_string() })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "message": err.response_message() })),
            )
                .into_response()
        }
    }
}
