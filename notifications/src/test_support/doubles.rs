//! Clock, sleeper, and sink doubles plus order fixtures.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::order_consumer::BackoffSleeper;
use crate::domain::ports::{NotificationSink, NotificationSinkError, NotificationSummary};
use crate::domain::{Envelope, ORDER_CREATED_EVENT, OrderEvent, OrderItem};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Clock whose time only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move time forward.
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}"),
        };
        *lock(&self.0, "clock") += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Sleeper that returns at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl BackoffSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records requested durations and returns at once.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Durations requested so far.
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl BackoffSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// Notification sink that records deliveries and can fail on cue.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<NotificationSummary>>,
    failures: Mutex<VecDeque<NotificationSinkError>>,
}

impl RecordingSink {
    /// Fail the next delivery with `error`.
    pub fn fail_next(&self, error: NotificationSinkError) {
        lock(&self.failures, "sink failures").push_back(error);
    }

    /// Successful deliveries, in order.
    pub fn delivered(&self) -> Vec<NotificationSummary> {
        lock(&self.delivered, "sink deliveries").clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_order_notification(
        &self,
        summary: &NotificationSummary,
    ) -> Result<(), NotificationSinkError> {
        if let Some(error) = lock(&self.failures, "sink failures").pop_front() {
            return Err(error);
        }
        lock(&self.delivered, "sink deliveries").push(summary.clone());
        Ok(())
    }
}

/// A two-item `OrderCreated` event for `order_id`, totalling 39.0.
pub fn sample_order(order_id: &str) -> OrderEvent {
    OrderEvent {
        event_type: ORDER_CREATED_EVENT.to_owned(),
        order_id: order_id.to_owned(),
        customer_id: "customer-7".to_owned(),
        items: vec![
            OrderItem {
                product_id: "widget".to_owned(),
                quantity: 2,
                price: 9.5,
            },
            OrderItem {
                product_id: "gadget".to_owned(),
                quantity: 1,
                price: 20.0,
            },
        ],
    }
}

/// Queue body carrying [`sample_order`] in a notification envelope.
pub fn order_body(order_id: &str) -> String {
    let envelope = match Envelope::wrap(
        &sample_order(order_id),
        format!("envelope-{order_id}"),
        None,
        "2026-03-01T09:00:00Z",
    ) {
        Ok(envelope) => envelope,
        Err(error) => panic!("sample order must encode: {error}"),
    };
    match serde_json::to_string(&envelope) {
        Ok(body) => body,
        Err(error) => panic!("sample envelope must encode: {error}"),
    }
}
