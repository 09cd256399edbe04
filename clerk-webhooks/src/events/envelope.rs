//! The outer object of every Clerk webhook delivery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EventType, WebhookEvent};

/// An authenticated delivery, exactly as the provider sent it.
///
/// `data` is the raw decoded payload; it only takes a typed shape once the
/// dispatcher has matched `event_type` against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
    /// Always `"event"` for Clerk deliveries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Milliseconds since epoch when the event occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl VerifiedEnvelope {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            object: Some("event".to_string()),
            timestamp: None,
            instance_id: None,
        }
    }

    /// The catalog entry for this envelope, if the type is known.
    pub fn known_type(&self) -> Option<EventType> {
        EventType::from_wire(&self.event_type)
    }

    /// Decode into a typed event.
    ///
    /// Returns `Ok(None)` for event types outside the catalog.
    pub fn into_event(self) -> Result<Option<WebhookEvent>, serde_json::Error> {
        match self.known_type() {
            Some(event_type) => WebhookEvent::decode(event_type, self.data).map(Some),
            None => Ok(None),
        }
    }
}
