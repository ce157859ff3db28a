use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::AppState;

/// Client-side checkout callback fields, named as the gateway names them.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Verify a client-reported payment signature and record the payment.
#[utoipa::path(
    post,
    path = "/api/verify-payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified"),
        (status = 400, description = "Signature mismatch or invalid input"),
        (status = 500, description = "Persistence failure")
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Response {
    // The payment row keeps the originating request for audit.
    let raw_payload = serde_json::to_string(&request).unwrap_or_default();

    let result = state
        .reconciliation
        .verify_payment(
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
            raw_payload,
        )
        .await;

    match result {
        Ok(verification) => (
            StatusCode::OK,
            Json(json!({ "verified": true, "payment": verification.payment })),
        )
            .into_response(),
        Err(err @ (ServiceError::SignatureMismatch(_) | ServiceError::ValidationError(_))) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "verified": false, "message": err.to_string() })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "payment verification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "verified": false, "message": err.response_message() })),
            )
                .into_response()
        }
    }
}
