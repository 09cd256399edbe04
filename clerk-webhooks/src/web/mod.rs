//! Web server module for receiving Clerk webhooks.
//!
//! The router is a thin shell around [`WebhooksHandler`]:
//! - `GET /health` for liveness probes
//! - `POST <webhook path>` verifies the delivery and runs its handler
//!
//! [`WebhooksHandler`]: crate::dispatch::WebhooksHandler

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::dispatch::WebhooksHandler;

pub use handlers::{clerk_webhook, health, AppState, HealthResponse};

/// Build the application router.
pub fn router(webhook_path: &str, webhooks: WebhooksHandler) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(webhook_path, post(clerk_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(webhooks))
}
