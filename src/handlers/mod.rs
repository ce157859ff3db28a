use axum::http::HeaderMap;

use crate::errors::ServiceError;
use crate::signature;
use crate::AppState;

pub mod health;
pub mod orders;
pub mod payments;
pub mod webhooks;

/// Require a valid `x-admin-key` header for admin endpoints.
pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ServiceError> {
    let provided = headers
        .get("x-admin-key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if signature::constant_time_eq(provided, &state.config.admin_api_key) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "invalid or missing admin key".to_string(),
        ))
    }
}
