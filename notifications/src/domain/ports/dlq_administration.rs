//! Driving port for inspecting and redriving the dead-letter queue.
//!
//! Inbound adapters call [`DlqAdministration`] without knowing which queue
//! client sits behind it.

use async_trait::async_trait;

use super::QueueAttributes;
use crate::domain::{Error, OrderEvent};

/// A dead-lettered message whose body decoded to an order event.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDlqMessage {
    /// Queue message id.
    pub message_id: String,
    /// Receipt handle of the inspection lease.
    pub receipt_handle: String,
    /// The carried order event.
    pub event: OrderEvent,
    /// Envelope timestamp, when present.
    pub timestamp: Option<String>,
    /// How many times the message has been received.
    pub receive_count: Option<u32>,
}

/// A dead-lettered message whose body did not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodableDlqMessage {
    /// Queue message id.
    pub message_id: String,
    /// Receipt handle of the inspection lease.
    pub receipt_handle: String,
    /// Decode failure description.
    pub error: String,
    /// Body exactly as stored.
    pub raw_body: String,
}

/// One entry of a dead-letter listing.
#[derive(Debug, Clone, PartialEq)]
pub enum DlqMessageView {
    /// Body decoded.
    Decoded(DecodedDlqMessage),
    /// Body did not decode; the raw text is kept.
    Undecodable(UndecodableDlqMessage),
}

impl DlqMessageView {
    /// Queue message id of either variant.
    pub fn message_id(&self) -> &str {
        match self {
            Self::Decoded(message) => &message.message_id,
            Self::Undecodable(message) => &message.message_id,
        }
    }
}

/// Result of a dead-letter listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DlqListing {
    /// Dead-letter queue depth counters.
    pub queue_attributes: QueueAttributes,
    /// Up to one batch of messages, released again after inspection.
    pub messages: Vec<DlqMessageView>,
}

/// Per-message redrive status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStatus {
    /// Re-enqueued on the main queue and removed from the dead-letter queue.
    Retried,
    /// Left on (or returned to) the dead-letter queue.
    Failed,
}

/// Outcome of redriving one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryResult {
    /// Queue message id in the dead-letter queue.
    pub message_id: String,
    /// Whether the redrive completed.
    pub status: RetryStatus,
    /// Failure description when `status` is [`RetryStatus::Failed`].
    pub error: Option<String>,
}

impl RetryResult {
    /// A completed redrive.
    pub fn retried(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: RetryStatus::Retried,
            error: None,
        }
    }

    /// A failed redrive.
    pub fn failed(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: RetryStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// Summary of one redrive batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DlqRetryReport {
    /// Number of messages attempted.
    pub total_processed: usize,
    /// One entry per attempted message.
    pub results: Vec<RetryResult>,
}

/// Use-case port for dead-letter administration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DlqAdministration: Send + Sync {
    /// Report dead-letter depth and peek at one batch of messages.
    ///
    /// # Errors
    /// [`crate::domain::ErrorCode::ServiceUnavailable`] when the queue cannot
    /// be read at all.
    async fn list_messages(&self) -> Result<DlqListing, Error>;

    /// Move one batch of dead-lettered messages back to the main queue.
    ///
    /// # Errors
    /// [`crate::domain::ErrorCode::ServiceUnavailable`] when the batch cannot
    /// be received. Per-message failures are reported in the result instead.
    async fn retry_messages(&self) -> Result<DlqRetryReport, Error>;
}
