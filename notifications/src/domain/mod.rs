//! Domain types, ports, and services.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failure payload.
//! - `OrderEvent` / `Envelope`: the consumed event and its wrapper.
//! - `OrderConsumer`: long-poll worker over the main queue.
//! - `DlqAdminService`: list and redrive for the dead-letter queue.
//! - `OrderIntakeService`: validates and publishes new orders.

pub mod dlq_admin;
pub mod error;
pub mod fault_injection;
pub mod order_consumer;
pub mod order_event;
pub mod order_intake;
pub mod ports;

pub use self::dlq_admin::{DlqAdminConfig, DlqAdminService};
pub use self::error::{Error, ErrorCode};
pub use self::fault_injection::{
    DEFAULT_FAILURE_ORDER_ID, FaultInjector, NoFaultInjection, OrderIdFaultInjector,
};
pub use self::order_consumer::{
    Acknowledgement, BackoffSleeper, MessageOutcome, OrderConsumer, OrderConsumerConfig,
    OrderConsumerPorts, OrderConsumerRuntime, ProcessingError, TokioSleeper, VisibilityReset,
};
pub use self::order_event::{
    DecodedOrder, Envelope, NOTIFICATION_ENVELOPE_TYPE, ORDER_CREATED_EVENT, OrderDecodeError,
    OrderEvent, OrderItem, OrderValidationError, decode_order_message,
};
pub use self::order_intake::{OrderIntakeConfig, OrderIntakeService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use notifications::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::service_unavailable("queue offline"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
