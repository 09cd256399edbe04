//! Route verified events to their handlers and build the response.
//!
//! ```text
//! Received → Verified → Unhandled (404)
//!                     → Invoked → Responded (200 / pass-through)
//! ```

use std::env;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::config::{resolve_secret, HandlerErrorPolicy, WebhookConfig, SECRET_ENV_VAR};
use crate::error::{ConfigurationError, HandlerFailure, VerifyError, HANDLER_FAILED_BODY};
use crate::events::{EventType, VerifiedEnvelope};
use crate::signing::{SigningHeaders, Webhook, WebhookSecret};
use crate::verify::{extract_headers, verify};

/// Dispatch one verified envelope to the configured handler.
///
/// - Unknown or unregistered event types answer 404 with an empty body.
/// - A payload that does not fit the declared type answers 400.
/// - Otherwise the handler runs exactly once. Its response is returned
///   untouched; no response means 200 with an empty body.
///
/// Handler failures follow the configured [`HandlerErrorPolicy`].
pub async fn dispatch(
    config: &WebhookConfig,
    envelope: VerifiedEnvelope,
) -> Result<Response, HandlerFailure> {
    let Some(event_type) = envelope.known_type() else {
        info!(event_type = %envelope.event_type, known = false, "webhook_unhandled");
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    if !config.handlers().is_registered(event_type) {
        info!(event_type = %event_type, known = true, "webhook_unhandled");
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let event = match envelope.into_event() {
        Ok(Some(event)) => event,
        Ok(None) => return Ok(StatusCode::NOT_FOUND.into_response()),
        Err(source) => {
            let err = VerifyError::PayloadMismatch {
                event_type: event_type.as_str(),
                source,
            };
            warn!(event_type = %event_type, error = %err, "webhook_payload_mismatch");
            return Ok(err.into_response());
        }
    };

    let Some(invocation) = config.handlers().call(event) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    match invocation.await {
        Ok(Some(response)) => {
            info!(
                event_type = %event_type,
                status = response.status().as_u16(),
                "webhook_dispatched"
            );
            Ok(response)
        }
        Ok(None) => {
            info!(event_type = %event_type, status = 200, "webhook_dispatched");
            Ok(StatusCode::OK.into_response())
        }
        Err(source) => handler_failed(config.error_policy(), event_type, source),
    }
}

fn handler_failed(
    policy: HandlerErrorPolicy,
    event_type: EventType,
    source: anyhow::Error,
) -> Result<Response, HandlerFailure> {
    match policy {
        HandlerErrorPolicy::Propagate => Err(HandlerFailure {
            event_type: event_type.as_str(),
            source,
        }),
        HandlerErrorPolicy::Respond => {
            error!(event_type = %event_type, error = %source, "webhook_handler_failed");
            Ok((StatusCode::INTERNAL_SERVER_ERROR, HANDLER_FAILED_BODY).into_response())
        }
    }
}

/// Verifies and dispatches Clerk webhooks for one deployment.
///
/// The secret is resolved and decoded once, here, so a missing or broken
/// secret stops startup instead of failing every request. Cloning is cheap
/// and clones share the same configuration.
#[derive(Clone, Debug)]
pub struct WebhooksHandler {
    inner: Arc<HandlerInner>,
}

#[derive(Debug)]
struct HandlerInner {
    config: WebhookConfig,
    webhook: Webhook,
}

impl WebhooksHandler {
    /// Build a handler, falling back to `WEBHOOK_SECRET` when the config
    /// carries no secret.
    pub fn new(config: WebhookConfig) -> Result<Self, ConfigurationError> {
        let fallback = env::var(SECRET_ENV_VAR).ok();
        Self::with_fallback_secret(config, fallback.as_deref())
    }

    /// Build a handler with an explicit fallback instead of the environment.
    pub fn with_fallback_secret(
        config: WebhookConfig,
        fallback: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let raw = resolve_secret(config.secret.as_deref(), fallback)?;
        let secret = WebhookSecret::parse(&raw)?;
        let webhook = Webhook::new(secret).with_tolerance(config.signature_tolerance());

        info!(
            handlers = ?config.handlers(),
            tolerance_secs = webhook.tolerance().as_secs(),
            max_body_bytes = config.max_body_bytes(),
            handler_error_policy = ?config.error_policy(),
            "webhooks_handler_ready"
        );

        Ok(Self {
            inner: Arc::new(HandlerInner { config, webhook }),
        })
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.inner.config
    }

    /// Process one inbound request whose body is already in memory.
    ///
    /// Every outcome except a propagated handler failure is an HTTP response.
    pub async fn handle(
        &self,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<Response, HandlerFailure> {
        let signing_headers = match extract_headers(headers) {
            Ok(h) => h,
            Err(e) => return Ok(e.into_response()),
        };

        self.verify_and_dispatch(&signing_headers, body).await
    }

    /// Process one inbound request, reading the body only once the signing
    /// headers are present.
    ///
    /// A body over the configured limit or one that is not UTF-8 answers 400
    /// like any other unverifiable request.
    pub async fn handle_body(
        &self,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<Response, HandlerFailure> {
        let signing_headers = match extract_headers(headers) {
            Ok(h) => h,
            Err(e) => return Ok(e.into_response()),
        };

        let bytes = match to_bytes(body, self.inner.config.max_body_bytes()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(svix_id = %signing_headers.id, error = %e, "webhook_body_unreadable");
                return Ok(VerifyError::UnreadableBody(e).into_response());
            }
        };

        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(svix_id = %signing_headers.id, error = %e, "webhook_body_not_utf8");
                return Ok(VerifyError::InvalidUtf8(e).into_response());
            }
        };

        self.verify_and_dispatch(&signing_headers, text).await
    }

    async fn verify_and_dispatch(
        &self,
        signing_headers: &SigningHeaders,
        body: &str,
    ) -> Result<Response, HandlerFailure> {
        let envelope = match verify(&self.inner.webhook, body, signing_headers) {
            Ok(envelope) => envelope,
            Err(e) => return Ok(e.into_response()),
        };

        info!(
            svix_id = %signing_headers.id,
            event_type = %envelope.event_type,
            "webhook_verified_dispatching"
        );

        dispatch(&self.inner.config, envelope).await
    }
}
