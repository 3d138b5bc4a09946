//! Admin endpoints for the dead-letter queue.

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::{
    DecodedDlqMessage, DlqListing, DlqMessageView, DlqRetryReport, QueueAttributes, RetryResult,
    RetryStatus, UndecodableDlqMessage,
};
use crate::domain::{OrderEvent, OrderItem};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Queue depth counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueAttributesBody {
    pub approximate_number_of_messages: u64,
    pub approximate_number_of_messages_not_visible: u64,
    pub approximate_number_of_messages_delayed: u64,
}

impl From<QueueAttributes> for QueueAttributesBody {
    fn from(value: QueueAttributes) -> Self {
        Self {
            approximate_number_of_messages: value.approximate_number_of_messages,
            approximate_number_of_messages_not_visible: value
                .approximate_number_of_messages_not_visible,
            approximate_number_of_messages_delayed: value.approximate_number_of_messages_delayed,
        }
    }
}

/// Order line item payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemBody {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
}

impl From<OrderItem> for OrderItemBody {
    fn from(value: OrderItem) -> Self {
        Self {
            product_id: value.product_id,
            quantity: value.quantity,
            price: value.price,
        }
    }
}

/// Order event payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventBody {
    pub event_type: String,
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<OrderItemBody>,
}

impl From<OrderEvent> for OrderEventBody {
    fn from(value: OrderEvent) -> Self {
        Self {
            event_type: value.event_type,
            order_id: value.order_id,
            customer_id: value.customer_id,
            items: value.items.into_iter().map(OrderItemBody::from).collect(),
        }
    }
}

/// A dead-lettered message that decoded.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecodedDlqMessageBody {
    pub message_id: String,
    pub receipt_handle: String,
    pub event: OrderEventBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_count: Option<u32>,
}

/// A dead-lettered message that did not decode.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UndecodableDlqMessageBody {
    pub message_id: String,
    pub receipt_handle: String,
    /// Why decoding failed.
    pub error: String,
    pub raw_body: String,
}

/// One listed dead-letter message.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DlqMessageBody {
    Decoded(DecodedDlqMessageBody),
    Undecodable(UndecodableDlqMessageBody),
}

impl From<DlqMessageView> for DlqMessageBody {
    fn from(value: DlqMessageView) -> Self {
        match value {
            DlqMessageView::Decoded(DecodedDlqMessage {
                message_id,
                receipt_handle,
                event,
                timestamp,
                receive_count,
            }) => Self::Decoded(DecodedDlqMessageBody {
                message_id,
                receipt_handle,
                event: event.into(),
                timestamp,
                receive_count,
            }),
            DlqMessageView::Undecodable(UndecodableDlqMessage {
                message_id,
                receipt_handle,
                error,
                raw_body,
            }) => Self::Undecodable(UndecodableDlqMessageBody {
                message_id,
                receipt_handle,
                error,
                raw_body,
            }),
        }
    }
}

/// Response payload for a dead-letter listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDlqResponseBody {
    pub queue_attributes: QueueAttributesBody,
    pub messages: Vec<DlqMessageBody>,
}

impl From<DlqListing> for ListDlqResponseBody {
    fn from(value: DlqListing) -> Self {
        Self {
            queue_attributes: value.queue_attributes.into(),
            messages: value.messages.into_iter().map(DlqMessageBody::from).collect(),
        }
    }
}

/// Redrive status of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RetryStatusBody {
    Retried,
    Failed,
}

/// Redrive result for one message.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryResultBody {
    pub message_id: String,
    pub status: RetryStatusBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RetryResult> for RetryResultBody {
    fn from(value: RetryResult) -> Self {
        Self {
            message_id: value.message_id,
            status: match value.status {
                RetryStatus::Retried => RetryStatusBody::Retried,
                RetryStatus::Failed => RetryStatusBody::Failed,
            },
            error: value.error,
        }
    }
}

/// Response payload for a redrive batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryDlqResponseBody {
    pub total_processed: usize,
    pub results: Vec<RetryResultBody>,
}

impl From<DlqRetryReport> for RetryDlqResponseBody {
    fn from(value: DlqRetryReport) -> Self {
        Self {
            total_processed: value.total_processed,
            results: value.results.into_iter().map(RetryResultBody::from).collect(),
        }
    }
}

/// Report dead-letter depth and peek at up to ten messages.
///
/// Messages are released again straight away; nothing is deleted.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dlq",
    responses(
        (status = 200, description = "Dead-letter queue contents", body = ListDlqResponseBody),
        (status = 503, description = "Queue service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listDlqMessages"
)]
#[get("/admin/dlq")]
pub async fn list_dlq_messages(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let listing = state.dlq.list_messages().await?;
    Ok(HttpResponse::Ok().json(ListDlqResponseBody::from(listing)))
}

/// Move up to ten dead-lettered messages back to the main queue.
#[utoipa::path(
    post,
    path = "/api/v1/admin/dlq/retry",
    responses(
        (status = 200, description = "Per-message redrive results", body = RetryDlqResponseBody),
        (status = 503, description = "Queue service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "retryDlqMessages"
)]
#[post("/admin/dlq/retry")]
pub async fn retry_dlq_messages(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let report = state.dlq.retry_messages().await?;
    Ok(HttpResponse::Ok().json(RetryDlqResponseBody::from(report)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::Error;
    use crate::domain::ports::{MockDlqAdministration, MockOrderSubmission};
    use crate::test_support::sample_order;

    fn app_state(dlq: MockDlqAdministration) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(dlq),
            Arc::new(MockOrderSubmission::new()),
        ))
    }

    async fn call(dlq: MockDlqAdministration, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new().app_data(app_state(dlq)).service(
                web::scope("/api/v1")
                    .service(list_dlq_messages)
                    .service(retry_dlq_messages),
            ),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body: Value = actix_test::read_body_json(response).await;
        (status, body)
    }

    #[rstest]
    #[actix_rt::test]
    async fn listing_serialises_both_message_shapes() {
        let mut dlq = MockDlqAdministration::new();
        dlq.expect_list_messages().times(1).return_once(|| {
            Ok(DlqListing {
                queue_attributes: QueueAttributes {
                    approximate_number_of_messages: 2,
                    approximate_number_of_messages_not_visible: 0,
                    approximate_number_of_messages_delayed: 0,
                },
                messages: vec![
                    DlqMessageView::Decoded(DecodedDlqMessage {
                        message_id: "m-1".to_owned(),
                        receipt_handle: "r-1".to_owned(),
                        event: sample_order("fail-me"),
                        timestamp: Some("2026-03-01T09:00:00Z".to_owned()),
                        receive_count: Some(3),
                    }),
                    DlqMessageView::Undecodable(UndecodableDlqMessage {
                        message_id: "m-2".to_owned(),
                        receipt_handle: "r-2".to_owned(),
                        error: "malformed envelope: expected value".to_owned(),
                        raw_body: "invalid json".to_owned(),
                    }),
                ],
            })
        });

        let (status, body) = call(dlq, actix_test::TestRequest::get().uri("/api/v1/admin/dlq")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queueAttributes"]["approximateNumberOfMessages"], json!(2));
        assert_eq!(body["messages"][0]["messageId"], json!("m-1"));
        assert_eq!(body["messages"][0]["event"]["orderId"], json!("fail-me"));
        assert_eq!(body["messages"][0]["event"]["items"][0]["productId"], json!("widget"));
        assert_eq!(body["messages"][0]["receiveCount"], json!(3));
        assert_eq!(body["messages"][1]["rawBody"], json!("invalid json"));
        assert!(body["messages"][1].get("event").is_none());
    }

    #[rstest]
    #[actix_rt::test]
    async fn retry_reports_per_message_results() {
        let mut dlq = MockDlqAdministration::new();
        dlq.expect_retry_messages().times(1).return_once(|| {
            Ok(DlqRetryReport {
                total_processed: 2,
                results: vec![
                    RetryResult::retried("m-1"),
                    RetryResult::failed("m-2", "re-enqueue to main queue failed"),
                ],
            })
        });

        let (status, body) = call(
            dlq,
            actix_test::TestRequest::post().uri("/api/v1/admin/dlq/retry"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "totalProcessed": 2,
                "results": [
                    { "messageId": "m-1", "status": "retried" },
                    { "messageId": "m-2", "status": "failed", "error": "re-enqueue to main queue failed" }
                ]
            })
        );
    }

    #[rstest]
    #[actix_rt::test]
    async fn queue_outages_surface_as_service_unavailable() {
        let mut dlq = MockDlqAdministration::new();
        dlq.expect_list_messages()
            .times(1)
            .return_once(|| Err(Error::service_unavailable("failed to receive from dead-letter queue")));

        let (status, body) = call(dlq, actix_test::TestRequest::get().uri("/api/v1/admin/dlq")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], json!("service_unavailable"));
        assert_eq!(body["error"], json!("failed to receive from dead-letter queue"));
    }
}
