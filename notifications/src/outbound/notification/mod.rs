//! Notification sink that records deliveries as structured log events.
//!
//! Stands in for an email or push provider: each delivery becomes one `info`
//! event carrying the summary fields, so log pipelines can assert on it.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{NotificationSink, NotificationSinkError, NotificationSummary};

/// Log target used for delivered notifications.
pub const NOTIFICATION_LOG_TARGET: &str = "notifications::delivery";

/// [`NotificationSink`] that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send_order_notification(
        &self,
        summary: &NotificationSummary,
    ) -> Result<(), NotificationSinkError> {
        info!(
            target: NOTIFICATION_LOG_TARGET,
            event_type = %summary.event_type,
            order_id = %summary.order_id,
            customer_id = %summary.customer_id,
            item_count = summary.item_count,
            total = summary.total,
            "fake email sent"
        );
        Ok(())
    }
}
