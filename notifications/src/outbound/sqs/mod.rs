//! SQS outbound adapter.
//!
//! This module provides an `aws-sdk-sqs` implementation of the
//! `QueueClient` port and a helper that builds the SDK client from settings.

mod client;
mod convert;

pub use client::{SqsQueueClient, build_sdk_client};
