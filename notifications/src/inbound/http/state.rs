//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on driving ports and stay testable without a queue.

use std::sync::Arc;

use crate::domain::ports::{DlqAdministration, OrderSubmission};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Dead-letter administration use-case.
    pub dlq: Arc<dyn DlqAdministration>,
    /// Order intake use-case.
    pub orders: Arc<dyn OrderSubmission>,
}

impl HttpState {
    /// Bundle the driving ports.
    pub fn new(dlq: Arc<dyn DlqAdministration>, orders: Arc<dyn OrderSubmission>) -> Self {
        Self { dlq, orders }
    }
}
