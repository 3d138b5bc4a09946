//! Driven port for delivering order notifications.

use async_trait::async_trait;
use serde::Serialize;

use super::define_port_error;

/// What a notification about one order carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    /// Event type copied from the order event.
    pub event_type: String,
    /// Order the notification is about.
    pub order_id: String,
    /// Customer to notify.
    pub customer_id: String,
    /// Number of line items.
    pub item_count: usize,
    /// Sum of quantity times price over the items.
    pub total: f64,
}

define_port_error! {
    /// Errors surfaced by notification sinks.
    pub enum NotificationSinkError {
        /// The notification could not be delivered.
        Delivery { message: String } =>
            "notification delivery failed: {message}",
    }
}

/// Port for sending the customer-facing notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification. Failures make the consumer return the
    /// message to the queue.
    async fn send_order_notification(
        &self,
        summary: &NotificationSummary,
    ) -> Result<(), NotificationSinkError>;
}
