//! Checkout API Library
//!
//! Storefront checkout backend: gateway order creation, HMAC payment
//! verification, and webhook-driven order/payment reconciliation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

use services::reconciliation::ReconciliationService;

/// Shared application state, constructed once in `main` and injected into
/// handlers through axum.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub reconciliation: ReconciliationService,
}

/// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Routes nested under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(handlers::orders::create_order))
        .route("/verify-payment", post(handlers::payments::verify_payment))
        .route("/webhook", post(handlers::webhooks::webhook))
        .route("/admin/orders", get(handlers::orders::list_orders))
        .route("/health", get(handlers::health::health))
}

/// Assemble the application router for the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
