//! Order intake endpoint.

use actix_web::{HttpResponse, error::JsonPayloadError, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{AcceptedOrder, NewOrder};
use crate::domain::{Error, OrderItem};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dlq::OrderEventBody;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Line item in a submitted order.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
}

/// Request payload for `POST /api/v1/orders`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<OrderItemRequest>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(value: CreateOrderRequest) -> Self {
        Self {
            order_id: value.order_id,
            customer_id: value.customer_id,
            items: value
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

/// Response payload for an accepted order.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedOrderBody {
    /// Queue-assigned message id.
    pub message_id: String,
    /// Envelope `MessageId`.
    pub envelope_message_id: String,
    pub order: OrderEventBody,
}

impl From<AcceptedOrder> for AcceptedOrderBody {
    fn from(value: AcceptedOrder) -> Self {
        Self {
            message_id: value.queue_message_id,
            envelope_message_id: value.envelope_message_id,
            order: value.event.into(),
        }
    }
}

/// JSON extractor configuration returning domain-shaped 400 responses for
/// bodies that do not deserialise.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        Error::invalid_request(format!("invalid order payload: {err}")).into()
    })
}

/// Validate an order and publish it to the order queue.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order published", body = AcceptedOrderBody),
        (status = 400, description = "Invalid order", body = ErrorSchema),
        (status = 503, description = "Queue service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    payload: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let accepted = state
        .orders
        .submit_order(payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(AcceptedOrderBody::from(accepted)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{MockDlqAdministration, MockOrderSubmission};
    use crate::domain::{ORDER_CREATED_EVENT, OrderEvent};

    async fn post_order(orders: MockOrderSubmission, payload: Value) -> (StatusCode, Value) {
        let state = web::Data::new(HttpState::new(
            Arc::new(MockDlqAdministration::new()),
            Arc::new(orders),
        ));
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .service(web::scope("/api/v1").service(create_order)),
        )
        .await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(payload)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        let status = response.status();
        let body: Value = actix_test::read_body_json(response).await;
        (status, body)
    }

    #[rstest]
    #[actix_rt::test]
    async fn accepted_orders_return_created() {
        let mut orders = MockOrderSubmission::new();
        orders
            .expect_submit_order()
            .withf(|order| order.order_id == "order-1" && order.items.len() == 1)
            .times(1)
            .returning(|order| {
                Ok(AcceptedOrder {
                    queue_message_id: "queue-1".to_owned(),
                    envelope_message_id: "envelope-1".to_owned(),
                    event: OrderEvent {
                        event_type: ORDER_CREATED_EVENT.to_owned(),
                        order_id: order.order_id,
                        customer_id: order.customer_id,
                        items: order.items,
                    },
                })
            });

        let (status, body) = post_order(
            orders,
            json!({
                "orderId": "order-1",
                "customerId": "customer-1",
                "items": [{ "productId": "widget", "quantity": 2, "price": 29.99 }]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["messageId"], json!("queue-1"));
        assert_eq!(body["order"]["eventType"], json!("OrderCreated"));
        assert_eq!(body["order"]["items"][0]["quantity"], json!(2));
    }

    #[rstest]
    #[case::missing_items(json!({ "orderId": "o", "customerId": "c" }))]
    #[case::negative_quantity(json!({
        "orderId": "o",
        "customerId": "c",
        "items": [{ "productId": "p", "quantity": -1, "price": 1.0 }]
    }))]
    #[actix_rt::test]
    async fn undeserialisable_payloads_are_bad_requests(#[case] payload: Value) {
        let mut orders = MockOrderSubmission::new();
        orders.expect_submit_order().never();

        let (status, body) = post_order(orders, payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("invalid_request"));
    }

    #[rstest]
    #[actix_rt::test]
    async fn domain_validation_errors_pass_through() {
        let mut orders = MockOrderSubmission::new();
        orders.expect_submit_order().times(1).returning(|_| {
            Err(Error::invalid_request("order must contain at least one item")
                .with_details(json!({ "field": "items", "code": "empty" })))
        });

        let (status, body) = post_order(
            orders,
            json!({ "orderId": "o", "customerId": "c", "items": [] }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], json!("items"));
    }
}
