//! Order events and the notification envelope that carries them.
//!
//! An order event travels as a JSON string inside the `Message` field of a
//! notification envelope. Decoding is therefore two-layered: the queue body
//! must parse as an envelope, and the envelope's `Message` must parse as an
//! order event whose items hold the order invariants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ports::NotificationSummary;

/// Event type stamped on orders accepted by the intake endpoint.
pub const ORDER_CREATED_EVENT: &str = "OrderCreated";

/// Envelope `Type` for published notifications.
pub const NOTIFICATION_ENVELOPE_TYPE: &str = "Notification";

/// One line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product identifier.
    pub product_id: String,
    /// Units ordered; positive.
    pub quantity: u32,
    /// Unit price; finite and non-negative.
    pub price: f64,
}

impl OrderItem {
    /// Line subtotal.
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

/// The business event consumed by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    /// Event kind, for example [`ORDER_CREATED_EVENT`]. Absent on the wire
    /// decodes as empty.
    #[serde(default)]
    pub event_type: String,
    /// Order identifier.
    pub order_id: String,
    /// Customer identifier.
    pub customer_id: String,
    /// Line items.
    pub items: Vec<OrderItem>,
}

/// Order field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    /// `orderId` is empty or whitespace.
    #[error("orderId must not be blank")]
    BlankOrderId,
    /// `customerId` is empty or whitespace.
    #[error("customerId must not be blank")]
    BlankCustomerId,
    /// `items` is empty.
    #[error("order must contain at least one item")]
    NoItems,
    /// An item's `productId` is empty or whitespace.
    #[error("items[{index}].productId must not be blank")]
    BlankProductId {
        /// Position of the offending item.
        index: usize,
    },
    /// An item's quantity is zero.
    #[error("items[{index}].quantity must be a positive integer")]
    NonPositiveQuantity {
        /// Position of the offending item.
        index: usize,
    },
    /// An item's price is negative, NaN, or infinite.
    #[error("items[{index}].price must be a finite, non-negative number")]
    InvalidPrice {
        /// Position of the offending item.
        index: usize,
    },
}

impl OrderValidationError {
    /// JSON path of the offending field.
    pub fn field(&self) -> String {
        match self {
            Self::BlankOrderId => "orderId".to_owned(),
            Self::BlankCustomerId => "customerId".to_owned(),
            Self::NoItems => "items".to_owned(),
            Self::BlankProductId { index } => format!("items[{index}].productId"),
            Self::NonPositiveQuantity { index } => format!("items[{index}].quantity"),
            Self::InvalidPrice { index } => format!("items[{index}].price"),
        }
    }

    /// Stable reason code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlankOrderId | Self::BlankCustomerId | Self::BlankProductId { .. } => "blank",
            Self::NoItems => "empty",
            Self::NonPositiveQuantity { .. } => "not_positive",
            Self::InvalidPrice { .. } => "invalid_price",
        }
    }
}

impl OrderEvent {
    /// Check the per-item invariants every decoded order must hold.
    pub fn validate_items(&self) -> Result<(), OrderValidationError> {
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(OrderValidationError::NonPositiveQuantity { index });
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(OrderValidationError::InvalidPrice { index });
            }
        }
        Ok(())
    }

    /// Stricter check applied to newly submitted orders.
    pub fn validate_for_submission(&self) -> Result<(), OrderValidationError> {
        if self.order_id.trim().is_empty() {
            return Err(OrderValidationError::BlankOrderId);
        }
        if self.customer_id.trim().is_empty() {
            return Err(OrderValidationError::BlankCustomerId);
        }
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        if let Some(index) = self
            .items
            .iter()
            .position(|item| item.product_id.trim().is_empty())
        {
            return Err(OrderValidationError::BlankProductId { index });
        }
        self.validate_items()
    }

    /// Order total: sum of quantity times price.
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Summary handed to the notification sink.
    pub fn summary(&self) -> NotificationSummary {
        NotificationSummary {
            event_type: self.event_type.clone(),
            order_id: self.order_id.clone(),
            customer_id: self.customer_id.clone(),
            item_count: self.items.len(),
            total: self.total(),
        }
    }
}

/// Pub/sub notification wrapper around a serialised order event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope kind, normally [`NOTIFICATION_ENVELOPE_TYPE`].
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Publisher-assigned identifier.
    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Topic the event was published to.
    #[serde(rename = "TopicArn", default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
    /// The order event, JSON encoded as a string.
    #[serde(rename = "Message")]
    pub message: String,
    /// Publish time, kept as sent.
    #[serde(rename = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Why a queue body could not be turned into an order event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderDecodeError {
    /// The body is not an envelope.
    #[error("malformed envelope: {message}")]
    MalformedEnvelope {
        /// Parser detail.
        message: String,
    },
    /// The envelope's `Message` is not an order event.
    #[error("malformed order event: {message}")]
    MalformedEvent {
        /// Parser or validation detail.
        message: String,
    },
}

/// An envelope together with the order event it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedOrder {
    /// Outer envelope.
    pub envelope: Envelope,
    /// Inner order event.
    pub event: OrderEvent,
}

impl Envelope {
    /// Wrap an order event for publishing.
    ///
    /// # Errors
    /// Returns the serialiser error if the event cannot be encoded.
    pub fn wrap(
        event: &OrderEvent,
        message_id: impl Into<String>,
        topic_arn: Option<String>,
        timestamp: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: Some(NOTIFICATION_ENVELOPE_TYPE.to_owned()),
            message_id: Some(message_id.into()),
            topic_arn,
            message: serde_json::to_string(event)?,
            timestamp: Some(timestamp.into()),
        })
    }

    /// Parse a queue body as an envelope.
    ///
    /// # Errors
    /// [`OrderDecodeError::MalformedEnvelope`] when the body is not JSON or
    /// lacks a string `Message`.
    pub fn decode(body: &str) -> Result<Self, OrderDecodeError> {
        serde_json::from_str(body).map_err(|err| OrderDecodeError::MalformedEnvelope {
            message: err.to_string(),
        })
    }

    /// Parse and validate the carried order event.
    ///
    /// # Errors
    /// [`OrderDecodeError::MalformedEvent`] when `Message` is not an order
    /// event or an item breaks the order invariants.
    pub fn order_event(&self) -> Result<OrderEvent, OrderDecodeError> {
        let event: OrderEvent = serde_json::from_str(&self.message).map_err(|err| {
            OrderDecodeError::MalformedEvent {
                message: err.to_string(),
            }
        })?;
        event
            .validate_items()
            .map_err(|err| OrderDecodeError::MalformedEvent {
                message: err.to_string(),
            })?;
        Ok(event)
    }
}

/// Decode a raw queue body into its envelope and order event.
///
/// # Errors
/// See [`Envelope::decode`] and [`Envelope::order_event`].
///
/// # Examples
/// ```
/// use notifications::domain::decode_order_message;
///
/// let body = r#"{"Type":"Notification","Message":"{\"eventType\":\"OrderCreated\",\"orderId\":\"o-1\",\"customerId\":\"c-1\",\"items\":[]}"}"#;
/// let decoded = decode_order_message(body).expect("valid body");
/// assert_eq!(decoded.event.order_id, "o-1");
/// ```
pub fn decode_order_message(body: &str) -> Result<DecodedOrder, OrderDecodeError> {
    let envelope = Envelope::decode(body)?;
    let event = envelope.order_event()?;
    Ok(DecodedOrder { envelope, event })
}
