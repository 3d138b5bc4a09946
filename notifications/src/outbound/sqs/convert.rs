//! Translation between SDK shapes and the domain queue types.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::{Message, MessageAttributeValue, QueueAttributeName};

use crate::domain::ports::{MessageAttribute, QueueAttributes, QueueClientError, QueueMessage};

/// Longest long-poll wait SQS accepts.
pub(super) const MAX_WAIT_SECONDS: i32 = 20;
/// Longest visibility timeout SQS accepts (12 hours).
pub(super) const MAX_VISIBILITY_SECONDS: i32 = 43_200;

const LEGACY_CODE_PREFIX: &str = "AWS.SimpleQueueService.";
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestThrottled",
    "OverLimit",
    "KmsThrottled",
];
const REJECTION_CODES: &[&str] = &[
    "ReceiptHandleIsInvalid",
    "InvalidParameterValue",
    "InvalidAttributeValue",
    "InvalidMessageContents",
    "MessageNotInflight",
];

/// Whole seconds in `duration`, capped to `max`.
pub(super) fn seconds(duration: Duration, max: i32) -> i32 {
    i32::try_from(duration.as_secs()).map_or(max, |secs| secs.min(max))
}

/// Convert a received SDK message. Deliveries without a receipt handle
/// cannot be acknowledged and yield `None`.
pub(super) fn to_domain_message(message: &Message) -> Option<QueueMessage> {
    let receipt_handle = message.receipt_handle()?;
    let attributes = message
        .attributes()
        .map(|attributes| {
            attributes
                .iter()
                .map(|(name, value)| (name.as_str().to_owned(), value.clone()))
                .collect()
        })
        .unwrap_or_default();
    let message_attributes = message
        .message_attributes()
        .map(|attributes| {
            attributes
                .iter()
                .filter_map(|(name, value)| {
                    value.string_value().map(|string_value| {
                        (
                            name.clone(),
                            MessageAttribute {
                                data_type: value.data_type().to_owned(),
                                string_value: string_value.to_owned(),
                            },
                        )
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(QueueMessage {
        message_id: message.message_id().unwrap_or_default().to_owned(),
        receipt_handle: receipt_handle.to_owned(),
        body: message.body().unwrap_or_default().to_owned(),
        attributes,
        message_attributes,
    })
}

/// Build SDK message attributes for an outgoing message.
pub(super) fn to_sdk_attributes(
    attributes: &BTreeMap<String, MessageAttribute>,
) -> Result<HashMap<String, MessageAttributeValue>, QueueClientError> {
    attributes
        .iter()
        .map(|(name, attribute)| {
            MessageAttributeValue::builder()
                .data_type(attribute.data_type.as_str())
                .string_value(attribute.string_value.as_str())
                .build()
                .map(|value| (name.clone(), value))
                .map_err(|err| {
                    QueueClientError::rejected(format!("invalid message attribute {name}: {err}"))
                })
        })
        .collect()
}

/// Read depth counters; missing or unparsable values count as zero.
pub(super) fn to_queue_attributes(
    attributes: Option<&HashMap<QueueAttributeName, String>>,
) -> QueueAttributes {
    let count = |name: QueueAttributeName| {
        attributes
            .and_then(|attributes| attributes.get(&name))
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0)
    };
    QueueAttributes {
        approximate_number_of_messages: count(QueueAttributeName::ApproximateNumberOfMessages),
        approximate_number_of_messages_not_visible: count(
            QueueAttributeName::ApproximateNumberOfMessagesNotVisible,
        ),
        approximate_number_of_messages_delayed: count(
            QueueAttributeName::ApproximateNumberOfMessagesDelayed,
        ),
    }
}

/// Map an SDK failure onto the port error taxonomy.
pub(super) fn map_sdk_error<E, R>(error: SdkError<E, R>) -> QueueClientError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&error).to_string();
    match &error {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            QueueClientError::transport(message)
        }
        SdkError::ServiceError(context) => classify_service_error(context.err().code(), message),
        _ => QueueClientError::service(error.code().unwrap_or("unknown"), message),
    }
}

pub(super) fn classify_service_error(code: Option<&str>, message: String) -> QueueClientError {
    let Some(code) = code else {
        return QueueClientError::service("unknown", message);
    };
    let bare = code.strip_prefix(LEGACY_CODE_PREFIX).unwrap_or(code);
    if THROTTLING_CODES.contains(&bare) {
        QueueClientError::throttled(message)
    } else if REJECTION_CODES.contains(&bare) {
        QueueClientError::rejected(message)
    } else {
        QueueClientError::service(code, message)
    }
}
