use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Checkout API",
        version = "0.2.0",
        description = r#"
Storefront checkout backend.

Creates payment orders through the configured gateway, verifies checkout
callbacks and webhook deliveries via HMAC-SHA256 signatures, and records
orders and payments locally.

Admin endpoints require the `x-admin-key` header.
"#
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::payments::verify_payment,
        crate::handlers::webhooks::webhook,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::services::reconciliation::CreateOrderRequest,
        crate::services::reconciliation::OrderResponse,
        crate::services::reconciliation::PaymentResponse,
        crate::handlers::payments::VerifyPaymentRequest,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "Orders", description = "Order creation"),
        (name = "Payments", description = "Payment verification"),
        (name = "Webhooks", description = "Gateway webhook ingestion"),
        (name = "Admin", description = "Operator endpoints"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
