//! Webhook Gateway
//!
//! Receives page feed deliveries: answers the subscription handshake and
//! relays new comments to the assistant, posting its reply back.

pub mod handlers;
pub mod relay;
pub mod signing;
pub mod types;

use axum::routing::get;
use axum::Router;

use crate::api::AppState;

/// Webhook routes.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/webhook",
        get(handlers::verify_subscription).post(handlers::receive_events),
    )
}
