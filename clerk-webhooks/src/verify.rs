//! Verifier integration: turn an inbound request into a [`VerifiedEnvelope`].
//!
//! This module only assembles inputs for the signing primitive (header
//! values, canonical body) and translates its failures. The cryptography
//! lives in [`crate::signing`].

use axum::http::HeaderMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::VerifyError;
use crate::events::VerifiedEnvelope;
use crate::signing::{SigningHeaders, Webhook};

pub const SVIX_ID: &str = "svix-id";
pub const SVIX_TIMESTAMP: &str = "svix-timestamp";
pub const SVIX_SIGNATURE: &str = "svix-signature";

/// Pull the three signing headers out of a request.
///
/// Absent, empty or non-UTF-8 values all count as missing.
pub fn extract_headers(headers: &HeaderMap) -> Result<SigningHeaders, VerifyError> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    match (get(SVIX_ID), get(SVIX_TIMESTAMP), get(SVIX_SIGNATURE)) {
        (Some(id), Some(timestamp), Some(signature)) => Ok(SigningHeaders {
            id,
            timestamp,
            signature,
        }),
        (id, timestamp, signature) => {
            warn!(
                has_svix_id = id.is_some(),
                has_svix_timestamp = timestamp.is_some(),
                has_svix_signature = signature.is_some(),
                "webhook_headers_missing"
            );
            Err(VerifyError::MissingHeaders)
        }
    }
}

/// Parse a JSON body and re-serialize it compactly, keeping key order.
///
/// Clerk signs the compact serialization of the payload, so a body that was
/// pretty-printed or re-indented in transit still verifies.
pub fn canonical_body(raw_body: &str) -> Result<(Value, String), VerifyError> {
    let value: Value = serde_json::from_str(raw_body).map_err(VerifyError::MalformedBody)?;
    let canonical = serde_json::to_string(&value).map_err(VerifyError::MalformedBody)?;
    Ok((value, canonical))
}

/// Authenticate a delivery and return its envelope.
///
/// Header presence is checked before any cryptographic work. There is one
/// verification attempt per request; failures are terminal.
pub fn verify(
    webhook: &Webhook,
    raw_body: &str,
    headers: &SigningHeaders,
) -> Result<VerifiedEnvelope, VerifyError> {
    if headers.id.is_empty() || headers.timestamp.is_empty() || headers.signature.is_empty() {
        warn!("webhook_headers_missing");
        return Err(VerifyError::MissingHeaders);
    }

    let (value, canonical) = canonical_body(raw_body).map_err(|e| {
        warn!(svix_id = %headers.id, error = %e, "webhook_body_malformed");
        e
    })?;

    let result = webhook.verify(&canonical, headers).or_else(|err| {
        // Number formatting can differ between serializers, so a signature
        // over the exact bytes received is accepted as well.
        if canonical != raw_body && webhook.verify(raw_body, headers).is_ok() {
            debug!(svix_id = %headers.id, "webhook_verified_raw_body");
            Ok(())
        } else {
            Err(err)
        }
    });

    if let Err(err) = result {
        warn!(
            svix_id = %headers.id,
            svix_timestamp = %headers.timestamp,
            error = %err,
            "webhook_verification_failed"
        );
        return Err(VerifyError::VerificationFailed(err));
    }

    let envelope: VerifiedEnvelope = serde_json::from_value(value).map_err(|e| {
        warn!(svix_id = %headers.id, error = %e, "webhook_envelope_malformed");
        VerifyError::MalformedBody(e)
    })?;

    debug!(
        svix_id = %headers.id,
        event_type = %envelope.event_type,
        "webhook_verified"
    );

    Ok(envelope)
}
