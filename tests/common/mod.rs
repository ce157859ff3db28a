#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use checkout_api::{
    config::AppConfig,
    db,
    entities::payment,
    errors::ServiceError,
    gateway::{GatewayOrder, PaymentGateway},
    services::reconciliation::ReconciliationService,
    signature, AppState,
};

pub const GATEWAY_SECRET: &str = "test_gateway_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const ADMIN_KEY: &str = "test_admin_key";

/// Gateway stub: mints deterministic order ids without touching the network.
pub struct StubGateway {
    queued_ids: Mutex<VecDeque<String>>,
    counter: AtomicU64,
    fail_next: Mutex<bool>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            queued_ids: Mutex::new(VecDeque::new()),
            counter: AtomicU64::new(1),
            fail_next: Mutex::new(false),
        }
    }

    /// Make the next create_order call return this gateway order id.
    pub fn queue_order_id(&self, id: &str) {
        self.queued_ids.lock().unwrap().push_back(id.to_string());
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
        _notes: Option<&Value>,
    ) -> Result<GatewayOrder, ServiceError> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(ServiceError::GatewayError(
                "stub gateway unavailable".to_string(),
            ));
        }
        drop(fail);

        let id = self
            .queued_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                format!("order_test{}", self.counter.fetch_add(1, Ordering::SeqCst))
            });

        Ok(GatewayOrder {
            id,
            amount,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: "created".to_string(),
        })
    }
}

/// Helper harness backed by a per-test SQLite database and a stub gateway.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: Arc<StubGateway>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("checkout_test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let cfg = AppConfig {
            database_url: database_url.clone(),
            host: "127.0.0.1".to_string(),
            port: 18_080,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            auto_migrate: true,
            razorpay_key_id: "rzp_test_key".to_string(),
            razorpay_key_secret: GATEWAY_SECRET.to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            admin_api_key: ADMIN_KEY.to_string(),
            gateway_base_url: "http://127.0.0.1:0".to_string(),
            gateway_timeout_secs: 1,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: 1,
            db_min_connections: 1,
            db_connect_timeout_secs: 5,
            db_idle_timeout_secs: 60,
            db_acquire_timeout_secs: 5,
        };

        let pool = db::establish_connection(&database_url)
            .await
            .expect("test database");
        db::run_migrations(&pool).await.expect("migrations");
        let db_arc = Arc::new(pool);

        let gateway = Arc::new(StubGateway::new());
        let reconciliation = ReconciliationService::new(
            db_arc.clone(),
            gateway.clone(),
            cfg.razorpay_key_secret.clone(),
            cfg.effective_webhook_secret().to_string(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            reconciliation,
        };

        Self {
            router: checkout_api::build_router(state.clone()),
            state,
            gateway,
            _tmp: tmp,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match json_body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request")
    }

    /// Send raw bytes, preserving the exact body layout the signature covers.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        self.router
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .expect("request")
    }

    pub async fn count_payments(&self) -> u64 {
        payment::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count payments")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Signature the gateway would attach to a client-side checkout callback.
pub fn payment_signature(order_id: &str, payment_id: &str) -> String {
    signature::compute_signature(
        signature::payment_message(order_id, payment_id).as_bytes(),
        GATEWAY_SECRET.as_bytes(),
    )
}

/// Signature the gateway would attach to a webhook delivery.
pub fn webhook_signature(body: &[u8]) -> String {
    signature::compute_signature(body, WEBHOOK_SECRET.as_bytes())
}
