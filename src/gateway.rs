//! Client for the external payment gateway's Orders API.
//!
//! The gateway is an opaque collaborator behind [`PaymentGateway`]; tests
//! substitute their own implementation instead of reaching the network.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::errors::ServiceError;

/// Gateway-side order as returned by the Orders API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a Value>,
}

/// Mints orders on the external gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
        notes: Option<&Value>,
    ) -> Result<GatewayOrder, ServiceError>;
}

/// HTTP client for the Razorpay Orders API.
pub struct RazorpayClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }

    async fn post_order(&self, body: &CreateOrderBody<'_>) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(body)
            .send()
            .await
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    #[instrument(skip(self, notes), fields(amount = amount, currency = currency))]
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
        notes: Option<&Value>,
    ) -> Result<GatewayOrder, ServiceError> {
        let body = CreateOrderBody {
            amount,
            currency,
            receipt,
            notes,
        };

        // One bounded retry on transport failure only; an HTTP error response
        // means the gateway saw the request and is not retried.
        let response = match self.post_order(&body).await {
            Ok(response) => response,
            Err(err) if err.is_connect() || err.is_timeout() => {
                warn!(error = %err, "gateway order creation failed in transit, retrying once");
                self.post_order(&body)
                    .await
                    .map_err(|e| ServiceError::GatewayError(format!("order creation failed: {e}")))?
            }
            Err(err) => {
                return Err(ServiceError::GatewayError(format!(
                    "order creation failed: {err}"
                )))
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayError(format!(
                "gateway returned {status}: {detail}"
            )));
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("malformed gateway response: {e}")))
    }
}
