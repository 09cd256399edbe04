//! Clerk webhooks - verify Svix-signed deliveries and dispatch them to
//! typed handlers.
//!
//! ## Flow
//!
//! ```text
//! Request → extract svix headers → read body → verify signature
//!         → match event type → handler(payload)
//!         → response (handler's own, or 200 / 404 / 400)
//! ```
//!
//! The library does one request at a time with no queueing, retries or
//! deduplication; redelivery is the provider's job and idempotency is the
//! handler's.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handler;
pub mod signing;
pub mod verify;
pub mod web;

// Re-export commonly used types
pub use config::{Config, HandlerErrorPolicy, WebhookConfig};
pub use dispatch::{dispatch, WebhooksHandler};
pub use error::{ConfigurationError, HandlerFailure, SignatureError, VerifyError};
pub use events::{EventType, VerifiedEnvelope, WebhookEvent};
pub use handler::{Handler, HandlerResult};
pub use signing::{SigningHeaders, Webhook, WebhookSecret};
pub use verify::verify;
