//! Driving port for publishing new orders onto the order queue.

use async_trait::async_trait;

use crate::domain::{Error, OrderEvent, OrderItem};

/// An order as submitted by a client, before it is stamped as an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Order identifier.
    pub order_id: String,
    /// Customer identifier.
    pub customer_id: String,
    /// Line items.
    pub items: Vec<OrderItem>,
}

/// What the intake returns once an order is on the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedOrder {
    /// Queue-assigned id of the enqueued message.
    pub queue_message_id: String,
    /// Envelope id stamped at publish time.
    pub envelope_message_id: String,
    /// The event as published.
    pub event: OrderEvent,
}

/// Use-case port for order intake.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderSubmission: Send + Sync {
    /// Validate, stamp, wrap, and enqueue an order.
    ///
    /// # Errors
    /// [`crate::domain::ErrorCode::InvalidRequest`] for invalid orders and
    /// [`crate::domain::ErrorCode::ServiceUnavailable`] when the queue
    /// refuses the message.
    async fn submit_order(&self, order: NewOrder) -> Result<AcceptedOrder, Error>;
}
