//! Order/payment reconciliation.
//!
//! Orchestrates the three flows that touch order and payment state: minting
//! an order through the gateway, verifying a client-reported payment, and
//! ingesting webhook events. Both reporting paths for the same payment may
//! run concurrently; the idempotent payment insert and the conditional
//! status update make that race safe without locking.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{order, payment};
use crate::errors::ServiceError;
use crate::gateway::PaymentGateway;
use crate::repositories::{
    MarkPaidOutcome, NewOrder, NewPayment, OrderRepository, PaymentRepository,
};
use crate::signature;

const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Amount in minor currency units (paise); must be at least 1
    #[validate(range(min = 1, message = "Amount must be a positive integer in minor units"))]
    pub amount: i64,

    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter ISO code"))]
    pub currency: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Receipt must be between 1 and 64 characters"))]
    pub receipt: Option<String>,

    pub customer_name: Option<String>,

    #[validate(email(message = "customer_email must be a valid email address"))]
    pub customer_email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: String,
    pub receipt: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            order_id: model.order_id,
            receipt: model.receipt,
            amount: model.amount,
            currency: model.currency,
            status: model.status,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            payment_id: model.payment_id,
            order_id: model.order_id,
            status: model.status,
            method: model.method,
            created_at: model.created_at,
        }
    }
}

/// Successful client-side verification result.
#[derive(Debug)]
pub struct PaymentVerification {
    pub payment: PaymentResponse,
    /// Whether the referenced order was found and transitioned
    pub order_outcome: MarkPaidOutcome,
}

/// Acknowledgement for a verified webhook delivery.
#[derive(Debug)]
pub enum WebhookAck {
    /// A `payment.captured` event was applied (or absorbed as a replay)
    Processed { payment: PaymentResponse },
    /// A validly signed event type we do not act on
    Ignored { event: String },
}

/// Orchestrates order creation, payment verification, and webhook ingestion.
#[derive(Clone)]
pub struct ReconciliationService {
    orders: Arc<OrderRepository>,
    payments: Arc<PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    key_secret: String,
    webhook_secret: String,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        key_secret: String,
        webhook_secret: String,
    ) -> Self {
        Self {
            orders: Arc::new(OrderRepository::new(db.clone())),
            payments: Arc::new(PaymentRepository::new(db)),
            gateway,
            key_secret,
            webhook_secret,
        }
    }

    /// Mint an order on the gateway and persist the local row.
    #[instrument(skip(self, request), fields(amount = request.amount))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let currency = request
            .currency
            .as_deref()
            .unwrap_or(DEFAULT_CURRENCY)
            .to_ascii_uppercase();
        let receipt = request
            .receipt
            .clone()
            .unwrap_or_else(|| format!("rcpt_{}", Uuid::new_v4().simple()));

        let notes = build_notes(&request);
        let gateway_order = self
            .gateway
            .create_order(request.amount, &currency, &receipt, notes.as_ref())
            .await?;

        info!(order_id = %gateway_order.id, amount = gateway_order.amount, "gateway order created");

        // Amount and currency are echoed from the gateway response, which is
        // authoritative for what will actually be charged.
        let new_order = NewOrder {
            order_id: gateway_order.id.clone(),
            receipt: gateway_order.receipt.clone().unwrap_or(receipt),
            amount: gateway_order.amount,
            currency: gateway_order.currency.clone(),
            customer_name: request.customer_name.clone(),
            customer_email: request.customer_email.clone(),
        };

        // The gateway order already exists at this point. The insert is
        // idempotent on the gateway order id, so one retry closes most of the
        // persistence-failure window; past that the order id is logged as
        // pending reconciliation and the error surfaces to the caller.
        let stored = match self.orders.insert(new_order.clone()).await {
            Ok(stored) => stored,
            Err(first_err) => {
                warn!(
                    order_id = %new_order.order_id,
                    error = %first_err,
                    "order persistence failed after gateway success, retrying"
                );
                self.orders.insert(new_order).await.map_err(|retry_err| {
                    error!(
                        order_id = %gateway_order.id,
                        error = %retry_err,
                        "order persistence failed twice; gateway order requires manual reconciliation"
                    );
                    retry_err
                })?
            }
        };

        Ok(stored.into())
    }

    /// Verify a client-reported payment against the gateway signature.
    ///
    /// The payment row is persisted either way (status `paid` or `failed`)
    /// for audit; on a mismatch the order is left untouched and
    /// `SignatureMismatch` is returned.
    #[instrument(skip(self, sig), fields(order_id = %order_id, payment_id = %payment_id))]
    pub async fn verify_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        sig: &str,
        raw_payload: String,
    ) -> Result<PaymentVerification, ServiceError> {
        if order_id.is_empty() || payment_id.is_empty() || sig.is_empty() {
            return Err(ServiceError::ValidationError(
                "razorpay_order_id, razorpay_payment_id and razorpay_signature are required"
                    .to_string(),
            ));
        }

        let message = signature::payment_message(order_id, payment_id);
        let verified = signature::verify(message.as_bytes(), self.key_secret.as_bytes(), sig);

        let (stored, inserted) = self
            .payments
            .insert_if_absent(NewPayment {
                payment_id: payment_id.to_string(),
                order_id: order_id.to_string(),
                signature: sig.to_string(),
                method: payment::METHOD_UNKNOWN.to_string(),
                status: if verified {
                    payment::status::PAID.to_string()
                } else {
                    payment::status::FAILED.to_string()
                },
                raw_payload,
            })
            .await?;

        if !verified {
            warn!("payment signature mismatch");
            return Err(ServiceError::SignatureMismatch(format!(
                "signature for payment {payment_id} does not match"
            )));
        }

        if !inserted {
            info!("payment already recorded; verification is a no-op");
        }

        let order_outcome = self.mark_order_paid(order_id, payment_id).await?;

        Ok(PaymentVerification {
            payment: stored.into(),
            order_outcome,
        })
    }

    /// Ingest a gateway webhook delivery.
    ///
    /// `raw_body` must be the exact bytes received on the wire; the signature
    /// covers those bytes, and re-serialized JSON is not byte-stable.
    #[instrument(skip(self, raw_body, signature_header))]
    pub async fn ingest_webhook(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<WebhookAck, ServiceError> {
        if !signature::verify(raw_body, self.webhook_secret.as_bytes(), signature_header) {
            warn!("webhook signature verification failed");
            return Err(ServiceError::WebhookSignatureInvalid);
        }

        let event_body: Value = serde_json::from_slice(raw_body)
            .map_err(|e| ServiceError::BadRequest(format!("invalid webhook payload: {e}")))?;

        let event = event_body
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if event != "payment.captured" {
            // Unhandled events are acknowledged so the gateway stops retrying.
            info!(event = %event, "ignoring unhandled webhook event");
            return Ok(WebhookAck::Ignored { event });
        }

        let entity = event_body
            .get("payload")
            .and_then(|p| p.get("payment"))
            .and_then(|p| p.get("entity"))
            .ok_or_else(|| {
                ServiceError::BadRequest("webhook payload missing payment entity".to_string())
            })?;

        let payment_id = entity
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ServiceError::BadRequest("payment entity missing id".to_string()))?;
        let order_id = entity
            .get("order_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ServiceError::BadRequest("payment entity missing order_id".to_string())
            })?;
        let method = entity
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or(payment::METHOD_UNKNOWN);

        let (stored, inserted) = self
            .payments
            .insert_if_absent(NewPayment {
                payment_id: payment_id.to_string(),
                order_id: order_id.to_string(),
                signature: signature_header.to_string(),
                method: method.to_string(),
                status: payment::status::PAID.to_string(),
                raw_payload: String::from_utf8_lossy(raw_body).into_owned(),
            })
            .await?;

        if !inserted {
            info!(payment_id = %payment_id, "webhook replay absorbed");
        }

        self.mark_order_paid(order_id, payment_id).await?;

        Ok(WebhookAck::Processed {
            payment: stored.into(),
        })
    }

    /// List orders for the admin surface, newest first.
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderResponse>, u64), ServiceError> {
        let (orders, total) = self.orders.list(page, per_page).await?;
        Ok((orders.into_iter().map(Into::into).collect(), total))
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<OrderResponse>, ServiceError> {
        Ok(self.orders.find_by_id(order_id).await?.map(Into::into))
    }

    async fn mark_order_paid(
        &self,
        order_id: &str,
        payment_id: &str,
    ) -> Result<MarkPaidOutcome, ServiceError> {
        let outcome = self.orders.mark_paid(order_id).await?;
        match outcome {
            MarkPaidOutcome::Updated => {
                info!(order_id = %order_id, "order marked paid");
            }
            MarkPaidOutcome::AlreadyPaid => {
                info!(order_id = %order_id, "order already paid");
            }
            MarkPaidOutcome::NotFound => {
                // Audit-and-continue: the payment row is kept even though the
                // order is unknown locally.
                warn!(
                    order_id = %order_id,
                    payment_id = %payment_id,
                    "payment references unknown order; recorded for audit"
                );
            }
        }
        Ok(outcome)
    }
}

fn build_notes(request: &CreateOrderRequest) -> Option<Value> {
    let mut notes = serde_json::Map::new();
    if let Some(name) = &request.customer_name {
        notes.insert("customer_name".to_string(), json!(name));
    }
    if let Some(email) = &request.customer_email {
        notes.insert("customer_email".to_string(), json!(email));
    }
    if notes.is_empty() {
        None
    } else {
        Some(Value::Object(notes))
    }
}
