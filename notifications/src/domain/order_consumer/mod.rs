//! Long-polling consumer for order events.
//!
//! Each received message is decoded, checked against the fault injector,
//! and handed to the notification sink. Success deletes the message; any
//! failure resets its visibility to zero so the queue redelivers it at once.
//! The queue's redrive policy, not this consumer, moves a message that keeps
//! failing onto the dead-letter queue. Delivery is therefore at least once,
//! and the sink must tolerate duplicates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::fault_injection::FaultInjector;
use crate::domain::order_event::{OrderDecodeError, decode_order_message};
use crate::domain::ports::{
    NotificationSink, NotificationSummary, QueueClient, QueueClientError, QueueMessage,
    ReceiveRequest,
};

mod runtime;

pub use runtime::{OrderConsumerPorts, OrderConsumerRuntime, TokioSleeper};

/// Poll loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConsumerConfig {
    /// Main queue URL.
    pub queue_url: String,
    /// Messages per receive, at most ten.
    pub max_messages: u8,
    /// Long-poll wait per receive.
    pub wait_time: Duration,
    /// Lease length for received messages.
    pub visibility_timeout: Duration,
    /// Pause after a failed receive.
    pub receive_error_backoff: Duration,
}

impl OrderConsumerConfig {
    /// Defaults: one message per receive, 20 s long poll, 5 s lease, 1 s
    /// backoff.
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            max_messages: 1,
            wait_time: Duration::from_secs(20),
            visibility_timeout: Duration::from_secs(5),
            receive_error_backoff: Duration::from_secs(1),
        }
    }

    fn receive_request(&self) -> ReceiveRequest {
        ReceiveRequest {
            max_messages: self.max_messages,
            wait_time: self.wait_time,
            visibility_timeout: self.visibility_timeout,
        }
        .clamped()
    }
}

/// Async sleeping abstraction for the receive backoff.
#[async_trait]
pub trait BackoffSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Why one message failed to process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    /// Body is not a notification envelope.
    #[error("malformed envelope: {message}")]
    MalformedEnvelope {
        /// Decoder detail.
        message: String,
    },
    /// Envelope payload is not a valid order event.
    #[error("malformed order event: {message}")]
    MalformedEvent {
        /// Decoder detail.
        message: String,
    },
    /// The fault injector selected this order.
    #[error("injected failure for order {order_id}")]
    InjectedFailure {
        /// Sentinel order id.
        order_id: String,
    },
    /// The sink refused the notification.
    #[error("notification sink failed: {message}")]
    SinkFailed {
        /// Sink error text.
        message: String,
    },
}

impl From<OrderDecodeError> for ProcessingError {
    fn from(err: OrderDecodeError) -> Self {
        match err {
            OrderDecodeError::MalformedEnvelope { message } => Self::MalformedEnvelope { message },
            OrderDecodeError::MalformedEvent { message } => Self::MalformedEvent { message },
        }
    }
}

/// What happened to a processed message's delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Removed from the queue.
    Deleted,
    /// Delete failed; the message reappears once its lease expires.
    DeleteFailed(QueueClientError),
}

/// What happened to a failed message's visibility reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityReset {
    /// Visible again immediately.
    Released,
    /// Reset failed; the message reappears once its lease expires.
    ReleaseFailed(QueueClientError),
}

/// Result of handling one message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// The sink accepted the notification.
    Processed {
        /// Queue message id.
        message_id: String,
        /// Notification that was sent.
        summary: NotificationSummary,
        /// Delete result.
        acknowledgement: Acknowledgement,
    },
    /// Processing failed and the message was returned to the queue.
    Failed {
        /// Queue message id.
        message_id: String,
        /// Failure cause.
        error: ProcessingError,
        /// Visibility reset result.
        visibility_reset: VisibilityReset,
    },
}

impl MessageOutcome {
    /// Queue message id of either variant.
    pub fn message_id(&self) -> &str {
        match self {
            Self::Processed { message_id, .. } | Self::Failed { message_id, .. } => message_id,
        }
    }

    /// Whether the notification was sent.
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

/// Domain-owned order event consumer.
pub struct OrderConsumer {
    queue: Arc<dyn QueueClient>,
    sink: Arc<dyn NotificationSink>,
    sleeper: Arc<dyn BackoffSleeper>,
    fault_injector: Arc<dyn FaultInjector>,
    config: OrderConsumerConfig,
}

impl OrderConsumer {
    /// Build a consumer using default runtime dependencies.
    pub fn new(ports: OrderConsumerPorts, config: OrderConsumerConfig) -> Self {
        Self::with_runtime(ports, OrderConsumerRuntime::default(), config)
    }

    /// Build a consumer with injected runtime abstractions.
    pub fn with_runtime(
        ports: OrderConsumerPorts,
        runtime: OrderConsumerRuntime,
        config: OrderConsumerConfig,
    ) -> Self {
        Self {
            queue: ports.queue,
            sink: ports.sink,
            sleeper: runtime.sleeper,
            fault_injector: runtime.fault_injector,
            config,
        }
    }

    /// Poll loop configuration.
    pub fn config(&self) -> &OrderConsumerConfig {
        &self.config
    }

    /// Run until `shutdown` changes or its sender is dropped.
    ///
    /// Shutdown interrupts a pending receive or backoff sleep. Messages
    /// already received are handled to completion first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(queue_url = %self.config.queue_url, "order consumer started");
        while !*shutdown.borrow() {
            let received = tokio::select! {
                received = self.receive() => received,
                _ = shutdown.changed() => break,
            };
            match received {
                Ok(messages) => {
                    for message in messages {
                        self.handle_message(message).await;
                    }
                }
                Err(error) => {
                    warn!(
                        queue_url = %self.config.queue_url,
                        error = %error,
                        backoff = ?self.config.receive_error_backoff,
                        "receive failed; backing off"
                    );
                    tokio::select! {
                        () = self.sleeper.sleep(self.config.receive_error_backoff) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }
        info!(queue_url = %self.config.queue_url, "order consumer stopped");
    }

    /// Receive one batch and handle every message in it, in order.
    ///
    /// # Errors
    /// Returns the queue error when the receive itself fails. Per-message
    /// failures are reported as [`MessageOutcome::Failed`] instead.
    pub async fn poll_once(&self) -> Result<Vec<MessageOutcome>, QueueClientError> {
        let messages = self.receive().await?;
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            outcomes.push(self.handle_message(message).await);
        }
        Ok(outcomes)
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueClientError> {
        let messages = self
            .queue
            .receive_messages(&self.config.queue_url, self.config.receive_request())
            .await?;
        if !messages.is_empty() {
            debug!(count = messages.len(), "received order messages");
        }
        Ok(messages)
    }

    /// Process one message and settle it with the queue.
    pub async fn handle_message(&self, message: QueueMessage) -> MessageOutcome {
        match self.process(&message).await {
            Ok(summary) => {
                let acknowledgement = self.acknowledge(&message).await;
                MessageOutcome::Processed {
                    message_id: message.message_id,
                    summary,
                    acknowledgement,
                }
            }
            Err(error) => {
                warn!(
                    message_id = %message.message_id,
                    receive_count = ?message.approximate_receive_count(),
                    error = %error,
                    "order message processing failed"
                );
                let visibility_reset = self.release(&message).await;
                MessageOutcome::Failed {
                    message_id: message.message_id,
                    error,
                    visibility_reset,
                }
            }
        }
    }

    async fn process(&self, message: &QueueMessage) -> Result<NotificationSummary, ProcessingError> {
        let decoded = decode_order_message(&message.body)?;
        let event = decoded.event;
        if self.fault_injector.should_fail(&event) {
            return Err(ProcessingError::InjectedFailure {
                order_id: event.order_id,
            });
        }
        let summary = event.summary();
        self.sink
            .send_order_notification(&summary)
            .await
            .map_err(|err| ProcessingError::SinkFailed {
                message: err.to_string(),
            })?;
        Ok(summary)
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Acknowledgement {
        match self
            .queue
            .delete_message(&self.config.queue_url, &message.receipt_handle)
            .await
        {
            Ok(()) => {
                info!(message_id = %message.message_id, "order message processed and deleted");
                Acknowledgement::Deleted
            }
            Err(error) => {
                warn!(
                    message_id = %message.message_id,
                    error = %error,
                    "delete failed; message will be redelivered after its lease expires"
                );
                Acknowledgement::DeleteFailed(error)
            }
        }
    }

    async fn release(&self, message: &QueueMessage) -> VisibilityReset {
        match self
            .queue
            .change_visibility(&self.config.queue_url, &message.receipt_handle, Duration::ZERO)
            .await
        {
            Ok(()) => VisibilityReset::Released,
            Err(error) => {
                warn!(
                    message_id = %message.message_id,
                    error = %error,
                    "visibility reset failed; message will be redelivered after its lease expires"
                );
                VisibilityReset::ReleaseFailed(error)
            }
        }
    }
}
