//! In-memory queue service with leases, receive counts, and redrive.
//!
//! Models the parts of the queue contract the consumer and the dead-letter
//! admin depend on: a receive hides messages for the requested visibility
//! timeout and issues a fresh receipt handle, deletes and visibility changes
//! need the latest receipt, and a source queue with a redrive policy moves a
//! message to its dead-letter queue once a receive finds it has already been
//! received `max_receive_count` times. Time comes from an injected clock.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    APPROXIMATE_RECEIVE_COUNT, MessageAttribute, OutgoingMessage, QueueAttributes, QueueClient,
    QueueClientError, QueueMessage, ReceiveRequest,
};

/// Queue operation, used to script failures and to record calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueOperation {
    /// `receive_messages`.
    Receive,
    /// `delete_message`.
    Delete,
    /// `change_visibility`.
    ChangeVisibility,
    /// `send_message`.
    Send,
    /// `queue_attributes`.
    Attributes,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueCall {
    /// Which operation.
    pub operation: QueueOperation,
    /// Target queue.
    pub queue_url: String,
    /// Receipt handle for delete and visibility calls.
    pub receipt_handle: Option<String>,
    /// New visibility for visibility calls.
    pub visibility_timeout: Option<Duration>,
}

/// Redrive policy attached to a source queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedrivePolicy {
    /// Where exhausted messages go.
    pub dead_letter_queue_url: String,
    /// Receives allowed before the next receive dead-letters the message.
    pub max_receive_count: u32,
}

/// Point-in-time view of a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessageSnapshot {
    /// Message id.
    pub message_id: String,
    /// Body.
    pub body: String,
    /// User attributes.
    pub message_attributes: BTreeMap<String, MessageAttribute>,
    /// Receives so far in this queue.
    pub receive_count: u32,
    /// Whether a receive right now could return it.
    pub visible: bool,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    message_attributes: BTreeMap<String, MessageAttribute>,
    receive_count: u32,
    receipt_handle: Option<String>,
    visible_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoredQueue {
    messages: Vec<StoredMessage>,
    redrive: Option<RedrivePolicy>,
}

#[derive(Debug)]
struct ScriptedFailure {
    operation: QueueOperation,
    queue_url: Option<String>,
    error: QueueClientError,
}

#[derive(Debug, Default)]
struct QueueState {
    queues: HashMap<String, StoredQueue>,
    failures: VecDeque<ScriptedFailure>,
    calls: Vec<QueueCall>,
}

/// In-memory [`QueueClient`].
pub struct InMemoryQueue {
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
}

const EMPTY_RECEIVE_PAUSE: Duration = Duration::from_millis(5);

fn after(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn non_existent_queue(queue_url: &str) -> QueueClientError {
    QueueClientError::service(
        "AWS.SimpleQueueService.NonExistentQueue",
        format!("queue {queue_url} does not exist"),
    )
}

fn invalid_receipt(receipt_handle: &str) -> QueueClientError {
    QueueClientError::rejected(format!("receipt handle {receipt_handle} is invalid"))
}

impl InMemoryQueue {
    /// Create an empty service reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(QueueState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory queue mutex poisoned"),
        }
    }

    /// Create a queue; existing queues are left untouched.
    pub fn create_queue(&self, queue_url: &str) {
        self.lock().queues.entry(queue_url.to_owned()).or_default();
    }

    /// Create `source` and `dead_letter` and link them with a redrive policy.
    pub fn create_queue_with_redrive(&self, source: &str, dead_letter: &str, max_receive_count: u32) {
        let mut state = self.lock();
        state.queues.entry(dead_letter.to_owned()).or_default();
        state.queues.entry(source.to_owned()).or_default().redrive = Some(RedrivePolicy {
            dead_letter_queue_url: dead_letter.to_owned(),
            max_receive_count,
        });
    }

    /// Store a message directly, bypassing call recording and scripting.
    pub fn enqueue(&self, queue_url: &str, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        let now = self.clock.utc();
        let mut state = self.lock();
        state
            .queues
            .entry(queue_url.to_owned())
            .or_default()
            .messages
            .push(StoredMessage {
                message_id: message_id.clone(),
                body: body.into(),
                message_attributes: BTreeMap::new(),
                receive_count: 0,
                receipt_handle: None,
                visible_at: now,
            });
        message_id
    }

    /// Make the next matching call fail with `error`. Scripted failures are
    /// consumed in order.
    pub fn fail_next(&self, operation: QueueOperation, error: QueueClientError) {
        self.lock().failures.push_back(ScriptedFailure {
            operation,
            queue_url: None,
            error,
        });
    }

    /// Like [`Self::fail_next`], but only for calls against `queue_url`.
    pub fn fail_next_on(&self, operation: QueueOperation, queue_url: &str, error: QueueClientError) {
        self.lock().failures.push_back(ScriptedFailure {
            operation,
            queue_url: Some(queue_url.to_owned()),
            error,
        });
    }

    /// Snapshot of a queue's messages in storage order.
    pub fn messages(&self, queue_url: &str) -> Vec<StoredMessageSnapshot> {
        let now = self.clock.utc();
        self.lock()
            .queues
            .get(queue_url)
            .map(|queue| {
                queue
                    .messages
                    .iter()
                    .map(|message| StoredMessageSnapshot {
                        message_id: message.message_id.clone(),
                        body: message.body.clone(),
                        message_attributes: message.message_attributes.clone(),
                        receive_count: message.receive_count,
                        visible: message.visible_at <= now,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of stored messages, visible or not.
    pub fn depth(&self, queue_url: &str) -> usize {
        self.lock()
            .queues
            .get(queue_url)
            .map_or(0, |queue| queue.messages.len())
    }

    /// Every call made through [`QueueClient`], in order.
    pub fn calls(&self) -> Vec<QueueCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one kind.
    pub fn calls_of(&self, operation: QueueOperation) -> Vec<QueueCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    fn begin(&self, call: QueueCall) -> Result<MutexGuard<'_, QueueState>, QueueClientError> {
        let mut state = self.lock();
        let scripted = state.failures.iter().position(|failure| {
            failure.operation == call.operation
                && failure
                    .queue_url
                    .as_deref()
                    .is_none_or(|url| url == call.queue_url)
        });
        state.calls.push(call);
        if let Some(index) = scripted
            && let Some(failure) = state.failures.remove(index)
        {
            return Err(failure.error);
        }
        Ok(state)
    }
}

fn simple_call(operation: QueueOperation, queue_url: &str) -> QueueCall {
    QueueCall {
        operation,
        queue_url: queue_url.to_owned(),
        receipt_handle: None,
        visibility_timeout: None,
    }
}

fn dead_letter_exhausted(state: &mut QueueState, queue_url: &str, now: DateTime<Utc>) {
    let Some(queue) = state.queues.get_mut(queue_url) else {
        return;
    };
    let Some(policy) = queue.redrive.clone() else {
        return;
    };
    let (exhausted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut queue.messages)
        .into_iter()
        .partition(|message| {
            message.visible_at <= now && message.receive_count >= policy.max_receive_count
        });
    queue.messages = kept;
    if exhausted.is_empty() {
        return;
    }
    let dead_letter = state
        .queues
        .entry(policy.dead_letter_queue_url)
        .or_default();
    dead_letter
        .messages
        .extend(exhausted.into_iter().map(|message| StoredMessage {
            receipt_handle: None,
            visible_at: now,
            ..message
        }));
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn receive_messages(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, QueueClientError> {
        let request = request.clamped();
        let received = {
            let mut state = self.begin(simple_call(QueueOperation::Receive, queue_url))?;
            let now = self.clock.utc();
            if !state.queues.contains_key(queue_url) {
                return Err(non_existent_queue(queue_url));
            }
            dead_letter_exhausted(&mut state, queue_url, now);
            let lease_until = after(now, request.visibility_timeout);
            let mut received = Vec::new();
            if let Some(queue) = state.queues.get_mut(queue_url) {
                for message in queue
                    .messages
                    .iter_mut()
                    .filter(|message| message.visible_at <= now)
                    .take(usize::from(request.max_messages))
                {
                    message.receive_count += 1;
                    let receipt_handle = Uuid::new_v4().to_string();
                    message.receipt_handle = Some(receipt_handle.clone());
                    message.visible_at = lease_until;
                    received.push(QueueMessage {
                        message_id: message.message_id.clone(),
                        receipt_handle,
                        body: message.body.clone(),
                        attributes: BTreeMap::from([(
                            APPROXIMATE_RECEIVE_COUNT.to_owned(),
                            message.receive_count.to_string(),
                        )]),
                        message_attributes: message.message_attributes.clone(),
                    });
                }
            }
            received
        };
        if received.is_empty() && !request.wait_time.is_zero() {
            tokio::time::sleep(EMPTY_RECEIVE_PAUSE.min(request.wait_time)).await;
        }
        Ok(received)
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueClientError> {
        let mut state = self.begin(QueueCall {
            receipt_handle: Some(receipt_handle.to_owned()),
            ..simple_call(QueueOperation::Delete, queue_url)
        })?;
        let queue = state
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| non_existent_queue(queue_url))?;
        let index = queue
            .messages
            .iter()
            .position(|message| message.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| invalid_receipt(receipt_handle))?;
        queue.messages.remove(index);
        Ok(())
    }

    async fn change_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: Duration,
    ) -> Result<(), QueueClientError> {
        let mut state = self.begin(QueueCall {
            receipt_handle: Some(receipt_handle.to_owned()),
            visibility_timeout: Some(visibility_timeout),
            ..simple_call(QueueOperation::ChangeVisibility, queue_url)
        })?;
        let now = self.clock.utc();
        let queue = state
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| non_existent_queue(queue_url))?;
        let message = queue
            .messages
            .iter_mut()
            .find(|message| message.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| invalid_receipt(receipt_handle))?;
        message.visible_at = after(now, visibility_timeout);
        Ok(())
    }

    async fn send_message(
        &self,
        queue_url: &str,
        message: &OutgoingMessage,
    ) -> Result<String, QueueClientError> {
        let mut state = self.begin(simple_call(QueueOperation::Send, queue_url))?;
        let now = self.clock.utc();
        let queue = state
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| non_existent_queue(queue_url))?;
        let message_id = Uuid::new_v4().to_string();
        queue.messages.push(StoredMessage {
            message_id: message_id.clone(),
            body: message.body.clone(),
            message_attributes: message.message_attributes.clone(),
            receive_count: 0,
            receipt_handle: None,
            visible_at: now,
        });
        Ok(message_id)
    }

    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes, QueueClientError> {
        let state = self.begin(simple_call(QueueOperation::Attributes, queue_url))?;
        let now = self.clock.utc();
        let queue = state
            .queues
            .get(queue_url)
            .ok_or_else(|| non_existent_queue(queue_url))?;
        let visible = queue
            .messages
            .iter()
            .filter(|message| message.visible_at <= now)
            .count();
        let hidden = queue.messages.len() - visible;
        Ok(QueueAttributes {
            approximate_number_of_messages: u64::try_from(visible).unwrap_or(u64::MAX),
            approximate_number_of_messages_not_visible: u64::try_from(hidden).unwrap_or(u64::MAX),
            approximate_number_of_messages_delayed: 0,
        })
    }
}
