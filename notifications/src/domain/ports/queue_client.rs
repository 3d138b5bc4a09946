//! Driven port for the message queue service.
//!
//! The domain owns the message, request, and attribute shapes so the
//! consumer and the dead-letter admin never see SDK types. Every call names
//! its target queue explicitly; one client serves both the main queue and
//! its dead-letter queue.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

/// Largest batch a single receive may request.
pub const MAX_RECEIVE_BATCH: u8 = 10;

/// System attribute carrying how many times a message has been received.
pub const APPROXIMATE_RECEIVE_COUNT: &str = "ApproximateReceiveCount";

/// Typed user attribute attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    /// Attribute data type (`String`, `Number`, ...).
    pub data_type: String,
    /// Attribute value rendered as text.
    pub string_value: String,
}

impl MessageAttribute {
    /// Build a `String`-typed attribute.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_owned(),
            string_value: value.into(),
        }
    }
}

/// A message leased from a queue.
///
/// The receipt handle is only valid for this delivery; a later receive of
/// the same message yields a different handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-assigned message identifier.
    pub message_id: String,
    /// Lease token used to delete or re-time this delivery.
    pub receipt_handle: String,
    /// Raw message body.
    pub body: String,
    /// System attributes such as [`APPROXIMATE_RECEIVE_COUNT`].
    pub attributes: BTreeMap<String, String>,
    /// User message attributes.
    pub message_attributes: BTreeMap<String, MessageAttribute>,
}

impl QueueMessage {
    /// Return the queue's receive count, when it was requested and parses.
    pub fn approximate_receive_count(&self) -> Option<u32> {
        self.attributes
            .get(APPROXIMATE_RECEIVE_COUNT)
            .and_then(|value| value.parse().ok())
    }
}

/// Parameters for one receive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// Batch size, at most [`MAX_RECEIVE_BATCH`].
    pub max_messages: u8,
    /// Long-poll wait; zero means return immediately.
    pub wait_time: Duration,
    /// How long received messages stay hidden from other consumers.
    pub visibility_timeout: Duration,
}

impl ReceiveRequest {
    /// Clamp the batch size into `1..=MAX_RECEIVE_BATCH`.
    pub fn clamped(self) -> Self {
        Self {
            max_messages: self.max_messages.clamp(1, MAX_RECEIVE_BATCH),
            ..self
        }
    }
}

/// A message to enqueue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    /// Message body.
    pub body: String,
    /// User message attributes.
    pub message_attributes: BTreeMap<String, MessageAttribute>,
}

impl OutgoingMessage {
    /// Build a message with a body and no attributes.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            message_attributes: BTreeMap::new(),
        }
    }
}

impl From<&QueueMessage> for OutgoingMessage {
    /// Carry body and user attributes across; system attributes stay behind.
    fn from(message: &QueueMessage) -> Self {
        Self {
            body: message.body.clone(),
            message_attributes: message.message_attributes.clone(),
        }
    }
}

/// Approximate queue depth counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueAttributes {
    /// Messages available for retrieval.
    pub approximate_number_of_messages: u64,
    /// Messages currently leased to a consumer.
    pub approximate_number_of_messages_not_visible: u64,
    /// Messages delayed and not yet available.
    pub approximate_number_of_messages_delayed: u64,
}

define_port_error! {
    /// Errors surfaced by queue adapters.
    pub enum QueueClientError {
        /// The request never reached the service or timed out.
        Transport { message: String } =>
            "queue transport failed: {message}",
        /// The service throttled the request.
        Throttled { message: String } =>
            "queue throttled request: {message}",
        /// The service rejected the request, for example a stale receipt.
        Rejected { message: String } =>
            "queue rejected request: {message}",
        /// Any other service-side error.
        Service { code: String, message: String } =>
            "queue service error {code}: {message}",
    }
}

impl QueueClientError {
    /// Return whether retrying the same call later is expected to help.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Throttled { .. })
    }
}

/// Port for queue operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Lease up to `request.max_messages` messages. An empty result after the
    /// wait elapses is not an error.
    async fn receive_messages(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, QueueClientError>;

    /// Permanently remove the delivery identified by `receipt_handle`.
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueClientError>;

    /// Change how long the delivery stays hidden. Zero releases it at once.
    async fn change_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: Duration,
    ) -> Result<(), QueueClientError>;

    /// Enqueue a message, returning its new message id.
    async fn send_message(
        &self,
        queue_url: &str,
        message: &OutgoingMessage,
    ) -> Result<String, QueueClientError>;

    /// Read approximate depth counters.
    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes, QueueClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn message_with_count(count: &str) -> QueueMessage {
        QueueMessage {
            message_id: "m-1".to_owned(),
            receipt_handle: "r-1".to_owned(),
            body: "{}".to_owned(),
            attributes: BTreeMap::from([(APPROXIMATE_RECEIVE_COUNT.to_owned(), count.to_owned())]),
            message_attributes: BTreeMap::new(),
        }
    }

    #[rstest]
    #[case("1", Some(1))]
    #[case("4", Some(4))]
    #[case("not-a-number", None)]
    fn receive_count_parses_system_attribute(#[case] raw: &str, #[case] expected: Option<u32>) {
        assert_eq!(message_with_count(raw).approximate_receive_count(), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(5, 5)]
    #[case(25, MAX_RECEIVE_BATCH)]
    fn receive_request_clamps_batch_size(#[case] requested: u8, #[case] expected: u8) {
        let request = ReceiveRequest {
            max_messages: requested,
            wait_time: Duration::ZERO,
            visibility_timeout: Duration::from_secs(30),
        };
        assert_eq!(request.clamped().max_messages, expected);
    }

    #[rstest]
    fn outgoing_copy_keeps_user_attributes_only() {
        let mut message = message_with_count("3");
        message
            .message_attributes
            .insert("source".to_owned(), MessageAttribute::string("orders-api"));

        let outgoing = OutgoingMessage::from(&message);

        assert_eq!(outgoing.body, "{}");
        assert_eq!(
            outgoing.message_attributes.get("source"),
            Some(&MessageAttribute::string("orders-api"))
        );
        assert_eq!(outgoing.message_attributes.len(), 1);
    }

    #[rstest]
    #[case(QueueClientError::transport("reset"), true)]
    #[case(QueueClientError::throttled("slow down"), true)]
    #[case(QueueClientError::rejected("stale receipt"), false)]
    #[case(QueueClientError::service("AccessDenied", "nope"), false)]
    fn transient_classification(#[case] error: QueueClientError, #[case] expected: bool) {
        assert_eq!(error.is_transient(), expected);
    }
}
