//! Dead-letter queue inspection and redrive.
//!
//! Listing leases a batch under a short inspection visibility and releases
//! each message straight away, so looking never delays a later redrive.
//! Redrive copies each message onto the main queue before deleting it from
//! the dead-letter queue; a message is never deleted unless its copy was
//! accepted. A failed delete after a successful copy leaves a duplicate,
//! which the at-least-once consumer already tolerates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::Error;
use crate::domain::order_event::decode_order_message;
use crate::domain::ports::{
    DecodedDlqMessage, DlqAdministration, DlqListing, DlqMessageView, DlqRetryReport,
    OutgoingMessage, QueueClient, QueueClientError, QueueMessage, ReceiveRequest, RetryResult,
    UndecodableDlqMessage,
};

/// Dead-letter admin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlqAdminConfig {
    /// Main queue that redriven messages go back to.
    pub main_queue_url: String,
    /// Dead-letter queue under administration.
    pub dead_letter_queue_url: String,
    /// Messages per list or retry call, at most ten.
    pub batch_size: u8,
    /// Lease taken while a batch is inspected or redriven.
    pub inspect_visibility_timeout: Duration,
    /// Long-poll wait for admin receives.
    pub receive_wait: Duration,
}

impl DlqAdminConfig {
    /// Defaults: batches of ten, 30 s inspection lease, 1 s wait.
    pub fn new(main_queue_url: impl Into<String>, dead_letter_queue_url: impl Into<String>) -> Self {
        Self {
            main_queue_url: main_queue_url.into(),
            dead_letter_queue_url: dead_letter_queue_url.into(),
            batch_size: 10,
            inspect_visibility_timeout: Duration::from_secs(30),
            receive_wait: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
enum RedriveError {
    #[error("re-enqueue to main queue failed: {0}")]
    Enqueue(#[source] QueueClientError),
    #[error("re-enqueued, but delete from dead-letter queue failed: {0}")]
    Delete(#[source] QueueClientError),
}

/// Dead-letter administration over a [`QueueClient`].
pub struct DlqAdminService {
    queue: Arc<dyn QueueClient>,
    config: DlqAdminConfig,
}

impl DlqAdminService {
    /// Build the service.
    pub fn new(queue: Arc<dyn QueueClient>, config: DlqAdminConfig) -> Self {
        Self { queue, config }
    }

    fn unavailable(&self, action: &str, error: &QueueClientError) -> Error {
        Error::service_unavailable(format!("failed to {action} dead-letter queue: {error}"))
    }

    async fn receive_batch(&self) -> Result<Vec<QueueMessage>, Error> {
        let request = ReceiveRequest {
            max_messages: self.config.batch_size,
            wait_time: self.config.receive_wait,
            visibility_timeout: self.config.inspect_visibility_timeout,
        }
        .clamped();
        self.queue
            .receive_messages(&self.config.dead_letter_queue_url, request)
            .await
            .map_err(|err| self.unavailable("receive from", &err))
    }

    async fn release(&self, message: &QueueMessage) {
        if let Err(error) = self
            .queue
            .change_visibility(
                &self.config.dead_letter_queue_url,
                &message.receipt_handle,
                Duration::ZERO,
            )
            .await
        {
            warn!(
                message_id = %message.message_id,
                error = %error,
                "failed to release dead-letter message; it reappears after the inspection lease"
            );
        }
    }

    async fn redrive(&self, message: &QueueMessage) -> Result<(), RedriveError> {
        self.queue
            .send_message(&self.config.main_queue_url, &OutgoingMessage::from(message))
            .await
            .map_err(RedriveError::Enqueue)?;
        self.queue
            .delete_message(&self.config.dead_letter_queue_url, &message.receipt_handle)
            .await
            .map_err(RedriveError::Delete)
    }
}

fn view(message: QueueMessage) -> DlqMessageView {
    let receive_count = message.approximate_receive_count();
    match decode_order_message(&message.body) {
        Ok(decoded) => DlqMessageView::Decoded(DecodedDlqMessage {
            message_id: message.message_id,
            receipt_handle: message.receipt_handle,
            event: decoded.event,
            timestamp: decoded.envelope.timestamp,
            receive_count,
        }),
        Err(error) => DlqMessageView::Undecodable(UndecodableDlqMessage {
            message_id: message.message_id,
            receipt_handle: message.receipt_handle,
            error: error.to_string(),
            raw_body: message.body,
        }),
    }
}

#[async_trait]
impl DlqAdministration for DlqAdminService {
    async fn list_messages(&self) -> Result<DlqListing, Error> {
        let queue_attributes = self
            .queue
            .queue_attributes(&self.config.dead_letter_queue_url)
            .await
            .map_err(|err| self.unavailable("read attributes of", &err))?;
        let messages = self.receive_batch().await?;
        for message in &messages {
            self.release(message).await;
        }
        Ok(DlqListing {
            queue_attributes,
            messages: messages.into_iter().map(view).collect(),
        })
    }

    async fn retry_messages(&self) -> Result<DlqRetryReport, Error> {
        let messages = self.receive_batch().await?;
        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            match self.redrive(&message).await {
                Ok(()) => {
                    info!(message_id = %message.message_id, "dead-letter message redriven");
                    results.push(RetryResult::retried(message.message_id));
                }
                Err(error) => {
                    warn!(
                        message_id = %message.message_id,
                        error = %error,
                        "dead-letter redrive failed"
                    );
                    self.release(&message).await;
                    results.push(RetryResult::failed(message.message_id, error.to_string()));
                }
            }
        }
        Ok(DlqRetryReport {
            total_processed: results.len(),
            results,
        })
    }
}
