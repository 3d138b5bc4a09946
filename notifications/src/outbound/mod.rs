//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **sqs**: Amazon SQS (or an SQS-compatible endpoint) behind `QueueClient`
//! - **notification**: structured-log delivery behind `NotificationSink`
//!
//! Adapters translate between domain types and SDK shapes. They contain no
//! business logic.

pub mod notification;
pub mod sqs;
