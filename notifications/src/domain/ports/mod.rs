//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod dlq_administration;
mod notification_sink;
mod order_submission;
mod queue_client;

#[cfg(test)]
pub use dlq_administration::MockDlqAdministration;
pub use dlq_administration::{
    DecodedDlqMessage, DlqAdministration, DlqListing, DlqMessageView, DlqRetryReport,
    RetryResult, RetryStatus, UndecodableDlqMessage,
};
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
pub use notification_sink::{NotificationSink, NotificationSinkError, NotificationSummary};
#[cfg(test)]
pub use order_submission::MockOrderSubmission;
pub use order_submission::{AcceptedOrder, NewOrder, OrderSubmission};
#[cfg(test)]
pub use queue_client::MockQueueClient;
pub use queue_client::{
    APPROXIMATE_RECEIVE_COUNT, MAX_RECEIVE_BATCH, MessageAttribute, OutgoingMessage,
    QueueAttributes, QueueClient, QueueClientError, QueueMessage, ReceiveRequest,
};
