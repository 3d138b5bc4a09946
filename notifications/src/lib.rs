//! Order notifications service.
//!
//! Consumes order events from a queue, hands each one to a notification sink,
//! and leans on the queue's own redrive policy to dead-letter poison messages.
//! An admin HTTP surface lists and redrives dead-lettered messages.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::RequestLog;
