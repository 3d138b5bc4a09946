//! `aws-sdk-sqs` backed queue client.
//!
//! This adapter owns transport details only: request shaping, limit
//! clamping, and SDK error mapping. One client serves every queue URL.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::types::{MessageSystemAttributeName, QueueAttributeName};
use tracing::warn;

use super::convert::{
    MAX_VISIBILITY_SECONDS, MAX_WAIT_SECONDS, map_sdk_error, seconds, to_domain_message,
    to_queue_attributes, to_sdk_attributes,
};
use crate::domain::ports::{
    OutgoingMessage, QueueAttributes, QueueClient, QueueClientError, QueueMessage,
    ReceiveRequest,
};

const ALL_MESSAGE_ATTRIBUTES: &str = "All";

/// Build an SDK client for `region`, optionally pointed at a custom endpoint
/// such as LocalStack. Credentials come from the default provider chain.
pub async fn build_sdk_client(region: &str, endpoint_url: Option<&str>) -> aws_sdk_sqs::Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_owned()));
    if let Some(endpoint) = endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    let config = loader.load().await;
    aws_sdk_sqs::Client::new(&config)
}

/// Queue client adapter over an SQS SDK client.
#[derive(Clone)]
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
}

impl SqsQueueClient {
    /// Wrap an SDK client.
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive_messages(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, QueueClientError> {
        let request = request.clamped();
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(i32::from(request.max_messages))
            .wait_time_seconds(seconds(request.wait_time, MAX_WAIT_SECONDS))
            .visibility_timeout(seconds(request.visibility_timeout, MAX_VISIBILITY_SECONDS))
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .message_attribute_names(ALL_MESSAGE_ATTRIBUTES)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output
            .messages()
            .iter()
            .filter_map(|message| {
                let converted = to_domain_message(message);
                if converted.is_none() {
                    warn!(
                        queue_url,
                        message_id = message.message_id().unwrap_or("unknown"),
                        "received message without a receipt handle; skipping"
                    );
                }
                converted
            })
            .collect())
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueClientError> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn change_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: Duration,
    ) -> Result<(), QueueClientError> {
        self.client
            .change_message_visibility()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(seconds(visibility_timeout, MAX_VISIBILITY_SECONDS))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn send_message(
        &self,
        queue_url: &str,
        message: &OutgoingMessage,
    ) -> Result<String, QueueClientError> {
        let attributes = to_sdk_attributes(&message.message_attributes)?;
        let output = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(message.body.as_str())
            .set_message_attributes((!attributes.is_empty()).then_some(attributes))
            .send()
            .await
            .map_err(map_sdk_error)?;
        output.message_id().map(str::to_owned).ok_or_else(|| {
            QueueClientError::service("MissingMessageId", "send succeeded without a message id")
        })
    }

    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes, QueueClientError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesNotVisible)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesDelayed)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(to_queue_attributes(output.attributes()))
    }
}
