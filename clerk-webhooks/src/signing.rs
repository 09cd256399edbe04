//! Svix webhook signature scheme.
//!
//! Clerk delivers webhooks through Svix, which signs every request with
//! HMAC-SHA256 over `"{msg_id}.{timestamp}.{body}"`.
//! Reference: https://docs.svix.com/receiving/verifying-payloads/how-manual
//!
//! - The shared secret is shown in the dashboard as `whsec_<base64>`; the key
//!   is the base64-decoded part.
//! - `svix-signature` carries one or more space-separated `v1,<base64>`
//!   entries (several during secret rotation).
//! - `svix-timestamp` must be within the tolerance of the current time in
//!   either direction, which bounds replay.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Prefix Svix puts in front of the base64 key.
pub const SECRET_PREFIX: &str = "whsec_";

/// Default allowed clock skew between sender and receiver.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);

const SIGNATURE_VERSION: &str = "v1";

/// Decoded signing key.
///
/// `Debug` is redacted so the key never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret {
    key: Vec<u8>,
}

impl WebhookSecret {
    /// Parse a secret as shown in the dashboard, with or without `whsec_`.
    pub fn parse(raw: &str) -> Result<Self, SignatureError> {
        let trimmed = raw.trim();
        let encoded = trimmed.strip_prefix(SECRET_PREFIX).unwrap_or(trimmed);
        if encoded.is_empty() {
            return Err(SignatureError::EmptySecret);
        }

        let key = STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::SecretEncoding)?;
        if key.is_empty() {
            return Err(SignatureError::EmptySecret);
        }

        Ok(Self { key })
    }

    /// Use raw key bytes directly.
    pub fn from_bytes(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Render the secret in dashboard form (`whsec_<base64>`).
    pub fn to_encoded(&self) -> String {
        format!("{}{}", SECRET_PREFIX, STANDARD.encode(&self.key))
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecret")
            .field("key", &"<redacted>")
            .finish()
    }
}

/// The three values Svix sends alongside every delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningHeaders {
    /// `svix-id`: unique per message, stable across redeliveries
    pub id: String,
    /// `svix-timestamp`: unix seconds at signing time
    pub timestamp: String,
    /// `svix-signature`: space-separated `version,signature` entries
    pub signature: String,
}

/// Svix signature verifier bound to one secret.
#[derive(Debug, Clone)]
pub struct Webhook {
    secret: WebhookSecret,
    tolerance: Duration,
}

impl Webhook {
    pub fn new(secret: WebhookSecret) -> Self {
        Self {
            secret,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Override the allowed timestamp skew.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Produce a `svix-signature` header value for a message.
    pub fn sign(
        &self,
        msg_id: &str,
        timestamp: i64,
        payload: &str,
    ) -> Result<String, SignatureError> {
        let signature = STANDARD.encode(self.compute(msg_id, timestamp, payload)?);
        Ok(format!("{},{}", SIGNATURE_VERSION, signature))
    }

    /// Verify a payload against its signing headers using the current time.
    pub fn verify(&self, payload: &str, headers: &SigningHeaders) -> Result<(), SignatureError> {
        self.verify_at(payload, headers, unix_now())
    }

    /// Verify a payload as if the current time were `now` (unix seconds).
    pub fn verify_at(
        &self,
        payload: &str,
        headers: &SigningHeaders,
        now: i64,
    ) -> Result<(), SignatureError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;

        let tolerance = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);
        if now.saturating_sub(timestamp) > tolerance {
            return Err(SignatureError::TimestampTooOld);
        }
        if timestamp.saturating_sub(now) > tolerance {
            return Err(SignatureError::TimestampTooNew);
        }

        let expected = self.compute(&headers.id, timestamp, payload)?;

        let matched = headers
            .signature
            .split(' ')
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, encoded)| STANDARD.decode(encoded).ok())
            .any(|provided| bool::from(provided.ct_eq(&expected)));

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    fn compute(
        &self,
        msg_id: &str,
        timestamp: i64,
        payload: &str,
    ) -> Result<Vec<u8>, SignatureError> {
        let mut mac = match HmacSha256::new_from_slice(&self.secret.key) {
            Ok(m) => m,
            Err(_) => {
                warn!("svix_signature_invalid_key");
                return Err(SignatureError::InvalidKey);
            }
        };
        mac.update(format!("{}.{}.{}", msg_id, timestamp, payload).as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
