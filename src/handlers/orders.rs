use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::errors::ServiceError;
use crate::services::reconciliation::CreateOrderRequest;
use crate::{AppState, ListQuery};

/// Create a payment order via the gateway and persist it locally.
#[utoipa::path(
    post,
    path = "/api/create-order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created"),
        (status = 400, description = "Invalid request data"),
        (status = 500, description = "Gateway or persistence failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Response {
    match state.reconciliation.create_order(request).await {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(ServiceError::ValidationError(message)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": [message] })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "order creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "order creation failed",
                    "details": err.response_message(),
                })),
            )
                .into_response()
        }
    }
}

/// List orders, newest first. Requires the `x-admin-key` header.
#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<u64>, Query, description = "Rows per page")
    ),
    responses(
        (status = 200, description = "Orders listed"),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    super::require_admin(&state, &headers)?;

    let (orders, total) = state
        .reconciliation
        .list_orders(query.page, query.limit)
        .await?;

    Ok(Json(json!({ "orders": orders, "total": total })))
}
