//! Port and runtime dependency bundles for the order consumer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::fault_injection::{FaultInjector, NoFaultInjection};
use crate::domain::ports::{NotificationSink, QueueClient};

use super::BackoffSleeper;

/// Port bundle required by the order consumer.
pub struct OrderConsumerPorts {
    /// Queue adapter serving the main queue.
    pub queue: Arc<dyn QueueClient>,
    /// Notification delivery adapter.
    pub sink: Arc<dyn NotificationSink>,
}

impl OrderConsumerPorts {
    /// Build a strongly-typed consumer port bundle.
    pub fn new(queue: Arc<dyn QueueClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { queue, sink }
    }
}

/// Runtime helpers used by the poll loop.
pub struct OrderConsumerRuntime {
    /// Sleep used between failed receives.
    pub sleeper: Arc<dyn BackoffSleeper>,
    /// Deliberate failure policy.
    pub fault_injector: Arc<dyn FaultInjector>,
}

impl Default for OrderConsumerRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            fault_injector: Arc::new(NoFaultInjection),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl BackoffSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
