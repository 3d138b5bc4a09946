//! HTTP inbound adapter exposing the admin and intake endpoints.

pub mod dlq;
pub mod error;
pub mod health;
pub mod orders;
pub mod schemas;
pub mod state;

use actix_web::web;

pub use error::ApiResult;

/// Register the versioned API routes on a scope mounted at `/api/v1`.
///
/// Expects an [`state::HttpState`] in app data.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(orders::json_config())
        .service(dlq::list_dlq_messages)
        .service(dlq::retry_dlq_messages)
        .service(orders::create_order);
}
