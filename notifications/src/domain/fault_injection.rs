//! Deliberate processing failures for exercising the redrive path.
//!
//! A configured sentinel order id makes the consumer fail that order on
//! every delivery, so it walks the whole path from the main queue to the
//! dead-letter queue without touching the notification sink.

use super::OrderEvent;

/// Order id that triggers an injected failure unless configured otherwise.
pub const DEFAULT_FAILURE_ORDER_ID: &str = "fail-me";

/// Decides whether processing of an order should fail on purpose.
pub trait FaultInjector: Send + Sync {
    /// Return `true` to fail this event before the sink is called.
    fn should_fail(&self, event: &OrderEvent) -> bool;
}

/// Never injects a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaultInjection;

impl FaultInjector for NoFaultInjection {
    fn should_fail(&self, _event: &OrderEvent) -> bool {
        false
    }
}

/// Fails every event whose order id equals the configured sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIdFaultInjector {
    order_id: String,
}

impl OrderIdFaultInjector {
    /// Fail events carrying `order_id`.
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }

    /// The sentinel order id.
    pub fn order_id(&self) -> &str {
        &self.order_id
    }
}

impl Default for OrderIdFaultInjector {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_ORDER_ID)
    }
}

impl FaultInjector for OrderIdFaultInjector {
    fn should_fail(&self, event: &OrderEvent) -> bool {
        event.order_id == self.order_id
    }
}
