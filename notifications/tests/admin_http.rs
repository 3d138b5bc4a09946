//! HTTP surface tests with the real services behind the handlers.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test as actix_test, web};
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use notifications::RequestLog;
use notifications::domain::ports::QueueClientError;
use notifications::domain::{DlqAdminConfig, DlqAdminService, OrderIntakeConfig, OrderIntakeService};
use notifications::inbound::http::configure_api;
use notifications::inbound::http::health::{HealthState, live, ready};
use notifications::inbound::http::state::HttpState;
use notifications::middleware::REQUEST_ID_HEADER;
use notifications::test_support::{InMemoryQueue, MutableClock, QueueOperation, order_body};

const MAIN: &str = "queue://orders";
const DLQ: &str = "queue://orders-dlq";

struct Backend {
    queue: Arc<InMemoryQueue>,
    state: web::Data<HttpState>,
}

#[fixture]
fn backend() -> Backend {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .expect("valid start time");
    let clock = Arc::new(MutableClock::new(start));
    let queue = Arc::new(InMemoryQueue::new(clock.clone()));
    queue.create_queue_with_redrive(MAIN, DLQ, 3);
    let state = web::Data::new(HttpState::new(
        Arc::new(DlqAdminService::new(
            queue.clone(),
            DlqAdminConfig::new(MAIN, DLQ),
        )),
        Arc::new(OrderIntakeService::new(
            queue.clone(),
            clock,
            OrderIntakeConfig {
                queue_url: MAIN.to_owned(),
                topic_arn: None,
            },
        )),
    ));
    Backend { queue, state }
}

async fn send(backend: &Backend, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(backend.state.clone())
            .app_data(web::Data::new(HealthState::new()))
            .wrap(RequestLog)
            .service(web::scope("/api/v1").configure(configure_api))
            .service(ready)
            .service(live),
    )
    .await;
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let bytes = actix_test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

#[rstest]
#[actix_rt::test]
async fn listing_reports_depth_and_both_entry_shapes(backend: Backend) {
    let decoded = backend.queue.enqueue(DLQ, order_body("fail-me"));
    let raw = backend.queue.enqueue(DLQ, "invalid json");

    let (status, body) = send(&backend, actix_test::TestRequest::get().uri("/api/v1/admin/dlq")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queueAttributes"]["approximateNumberOfMessages"], json!(2));
    let messages = body["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 2);
    let by_id = |id: &str| {
        messages
            .iter()
            .find(|message| message["messageId"] == json!(id))
            .cloned()
            .expect("listed message")
    };
    let decoded = by_id(decoded.as_str());
    assert_eq!(decoded["event"]["orderId"], json!("fail-me"));
    assert_eq!(decoded["timestamp"], json!("2026-03-01T09:00:00Z"));
    assert!(decoded["receiptHandle"].is_string());
    let raw = by_id(raw.as_str());
    assert_eq!(raw["rawBody"], json!("invalid json"));
    assert!(raw["error"].is_string());

    assert_eq!(backend.queue.depth(DLQ), 2);
    assert!(backend.queue.messages(DLQ).iter().all(|message| message.visible));
}

#[rstest]
#[actix_rt::test]
async fn retry_moves_messages_back_to_the_main_queue(backend: Backend) {
    let id = backend.queue.enqueue(DLQ, order_body("order-8"));

    let (status, body) = send(
        &backend,
        actix_test::TestRequest::post().uri("/api/v1/admin/dlq/retry"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "totalProcessed": 1,
            "results": [{ "messageId": id, "status": "retried" }]
        })
    );
    assert_eq!(backend.queue.depth(DLQ), 0);
    assert_eq!(backend.queue.messages(MAIN)[0].body, order_body("order-8"));
}

#[rstest]
#[actix_rt::test]
async fn retry_reports_per_message_failures(backend: Backend) {
    let id = backend.queue.enqueue(DLQ, order_body("order-9"));
    backend.queue.fail_next_on(
        QueueOperation::Send,
        MAIN,
        QueueClientError::throttled("slow down"),
    );

    let (status, body) = send(
        &backend,
        actix_test::TestRequest::post().uri("/api/v1/admin/dlq/retry"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["messageId"], json!(id));
    assert_eq!(body["results"][0]["status"], json!("failed"));
    let error = body["results"][0]["error"].as_str().expect("error text");
    assert!(error.starts_with("re-enqueue to main queue failed"), "{error}");
    assert_eq!(backend.queue.depth(DLQ), 1);
    assert!(backend.queue.messages(DLQ)[0].visible);
}

#[rstest]
#[actix_rt::test]
async fn queue_outages_are_service_unavailable(backend: Backend) {
    backend.queue.fail_next(
        QueueOperation::Attributes,
        QueueClientError::transport("connection refused"),
    );

    let (status, body) = send(&backend, actix_test::TestRequest::get().uri("/api/v1/admin/dlq")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], json!("service_unavailable"));
    assert!(body["error"].as_str().expect("message").contains("connection refused"));
}

#[rstest]
#[actix_rt::test]
async fn submitted_orders_are_published(backend: Backend) {
    let (status, body) = send(
        &backend,
        actix_test::TestRequest::post().uri("/api/v1/orders").set_json(json!({
            "orderId": "order-10",
            "customerId": "customer-3",
            "items": [{ "productId": "kettle", "quantity": 1, "price": 45.0 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["eventType"], json!("OrderCreated"));
    let stored = backend.queue.messages(MAIN);
    assert_eq!(stored.len(), 1);
    assert_eq!(body["messageId"], json!(stored[0].message_id));
}

#[rstest]
#[actix_rt::test]
async fn invalid_orders_are_rejected(backend: Backend) {
    let (status, body) = send(
        &backend,
        actix_test::TestRequest::post().uri("/api/v1/orders").set_json(json!({
            "orderId": "order-11",
            "customerId": "customer-3",
            "items": [{ "productId": "kettle", "quantity": 0, "price": 45.0 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!({ "field": "items[0].quantity", "code": "not_positive" })
    );
    assert_eq!(backend.queue.depth(MAIN), 0);
}

#[rstest]
#[actix_rt::test]
async fn readiness_starts_unavailable_while_liveness_passes(backend: Backend) {
    let (ready_status, _) = send(&backend, actix_test::TestRequest::get().uri("/health/ready")).await;
    let (live_status, _) = send(&backend, actix_test::TestRequest::get().uri("/health/live")).await;

    assert_eq!(ready_status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(live_status, StatusCode::OK);
}
