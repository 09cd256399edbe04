//! Webhook endpoint handlers.

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderMap},
    response::Response,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::dispatch::WebhooksHandler;
use crate::error::HandlerFailure;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub webhooks: WebhooksHandler,
}

impl AppState {
    pub fn new(webhooks: WebhooksHandler) -> Self {
        Self { webhooks }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Clerk Webhook
// =============================================================================

/// Clerk webhook endpoint.
///
/// The body is taken unread so a request without signing headers is turned
/// away before any of it is buffered. A handler failure that the dispatcher
/// propagates is rendered by [`HandlerFailure`]'s `IntoResponse` as a bare 500.
pub async fn clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, HandlerFailure> {
    info!(
        content_length = ?headers.get(CONTENT_LENGTH),
        has_svix_id = headers.contains_key(crate::verify::SVIX_ID),
        "webhook_received"
    );

    state.webhooks.handle_body(&headers, body).await
}
