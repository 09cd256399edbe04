//! Error types for webhook configuration, verification and dispatch.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Body returned when any of the signing headers is absent.
pub const MISSING_HEADERS_BODY: &str = "Error occurred -- no svix headers";

/// Body returned when a request cannot be verified.
pub const VERIFICATION_FAILED_BODY: &str = "Error occurred";

/// Body returned when a handler fails under [`HandlerErrorPolicy::Respond`].
///
/// [`HandlerErrorPolicy::Respond`]: crate::config::HandlerErrorPolicy::Respond
pub const HANDLER_FAILED_BODY: &str = "Internal Server Error";

/// Fatal errors raised while building a [`WebhooksHandler`].
///
/// These stop the process before it serves traffic.
///
/// [`WebhooksHandler`]: crate::dispatch::WebhooksHandler
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(
        "webhook secret is not configured: set WEBHOOK_SECRET from the Clerk Dashboard \
         or pass a secret in WebhookConfig"
    )]
    MissingSecret,

    #[error("webhook secret is invalid: {0}")]
    InvalidSecret(#[from] SignatureError),
}

/// Failures reported by the signing primitive.
///
/// Messages never include key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("secret is empty")]
    EmptySecret,

    #[error("secret is not valid base64")]
    SecretEncoding,

    #[error("secret cannot be used as an HMAC key")]
    InvalidKey,

    #[error("timestamp header is not a unix timestamp")]
    InvalidTimestamp,

    #[error("message timestamp too old")]
    TimestampTooOld,

    #[error("message timestamp too new")]
    TimestampTooNew,

    #[error("no matching signature found")]
    NoMatchingSignature,
}

/// Per-request rejections. Each maps to a 400 response.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("missing svix headers")]
    MissingHeaders,

    #[error("request body could not be read: {0}")]
    UnreadableBody(#[source] axum::Error),

    #[error("request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("signature verification failed: {0}")]
    VerificationFailed(#[from] SignatureError),

    #[error("payload does not match event type {event_type}: {source}")]
    PayloadMismatch {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl VerifyError {
    /// Response body sent back to the provider for this rejection.
    pub fn body(&self) -> &'static str {
        match self {
            VerifyError::MissingHeaders => MISSING_HEADERS_BODY,
            _ => VERIFICATION_FAILED_BODY,
        }
    }
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.body()).into_response()
    }
}

/// A failure raised by a caller-supplied handler.
///
/// The dispatcher does not translate this: it is handed back to the host
/// runtime as-is.
#[derive(Debug, Error)]
#[error("handler for {event_type} failed: {source}")]
pub struct HandlerFailure {
    pub event_type: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl HandlerFailure {
    /// Unwrap the error returned by the handler.
    pub fn into_inner(self) -> anyhow::Error {
        self.source
    }
}

impl IntoResponse for HandlerFailure {
    fn into_response(self) -> Response {
        error!(
            event_type = self.event_type,
            error = %self.source,
            "webhook_handler_failure_unhandled"
        );
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
