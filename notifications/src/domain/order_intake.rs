//! Order intake: validate a submitted order and publish it as an event.
//!
//! Accepted orders are stamped `OrderCreated`, wrapped in a notification
//! envelope with a fresh id and the current time, and sent to the main queue
//! the consumer reads from.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{AcceptedOrder, NewOrder, OrderSubmission, OutgoingMessage, QueueClient};
use crate::domain::{Envelope, Error, ORDER_CREATED_EVENT, OrderEvent};

/// Intake configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntakeConfig {
    /// Queue that accepted orders are published to.
    pub queue_url: String,
    /// Topic recorded in the envelope, when one is configured.
    pub topic_arn: Option<String>,
}

/// [`OrderSubmission`] backed by a [`QueueClient`].
pub struct OrderIntakeService {
    queue: Arc<dyn QueueClient>,
    clock: Arc<dyn Clock>,
    config: OrderIntakeConfig,
}

impl OrderIntakeService {
    /// Build the service.
    pub fn new(queue: Arc<dyn QueueClient>, clock: Arc<dyn Clock>, config: OrderIntakeConfig) -> Self {
        Self {
            queue,
            clock,
            config,
        }
    }
}

#[async_trait]
impl OrderSubmission for OrderIntakeService {
    async fn submit_order(&self, order: NewOrder) -> Result<AcceptedOrder, Error> {
        let event = OrderEvent {
            event_type: ORDER_CREATED_EVENT.to_owned(),
            order_id: order.order_id,
            customer_id: order.customer_id,
            items: order.items,
        };
        event.validate_for_submission().map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "field": err.field(),
                "code": err.code(),
            }))
        })?;

        let envelope_message_id = Uuid::new_v4().to_string();
        let envelope = Envelope::wrap(
            &event,
            envelope_message_id.clone(),
            self.config.topic_arn.clone(),
            self.clock.utc().to_rfc3339(),
        )
        .map_err(|err| Error::internal(format!("failed to encode order event: {err}")))?;
        let body = serde_json::to_string(&envelope)
            .map_err(|err| Error::internal(format!("failed to encode envelope: {err}")))?;

        let queue_message_id = self
            .queue
            .send_message(&self.config.queue_url, &OutgoingMessage::new(body))
            .await
            .map_err(|err| Error::service_unavailable(format!("failed to publish order: {err}")))?;

        info!(
            order_id = %event.order_id,
            queue_message_id = %queue_message_id,
            "order published"
        );
        Ok(AcceptedOrder {
            queue_message_id,
            envelope_message_id,
            event,
        })
    }
}
