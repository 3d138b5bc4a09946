//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the admin, intake, and health endpoints together
//! with the error schema wrappers. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::dlq::{
    DecodedDlqMessageBody, DlqMessageBody, ListDlqResponseBody, OrderEventBody, OrderItemBody,
    QueueAttributesBody, RetryDlqResponseBody, RetryResultBody, RetryStatusBody,
    UndecodableDlqMessageBody,
};
use crate::inbound::http::orders::{AcceptedOrderBody, CreateOrderRequest, OrderItemRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// OpenAPI document for the HTTP interface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order notifications service",
        description = "Dead-letter queue administration, order intake, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::dlq::list_dlq_messages,
        crate::inbound::http::dlq::retry_dlq_messages,
        crate::inbound::http::orders::create_order,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        QueueAttributesBody,
        OrderItemBody,
        OrderEventBody,
        DecodedDlqMessageBody,
        UndecodableDlqMessageBody,
        DlqMessageBody,
        ListDlqResponseBody,
        RetryStatusBody,
        RetryResultBody,
        RetryDlqResponseBody,
        OrderItemRequest,
        CreateOrderRequest,
        AcceptedOrderBody,
    )),
    tags(
        (name = "admin", description = "Dead-letter queue inspection and redrive"),
        (name = "orders", description = "Order intake"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
