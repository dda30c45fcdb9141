//! Gateway message envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ProtocolError;
use crate::protocol::EventName;

/// One frame on the wire
///
/// The event is kept as a raw string so that an unknown event still decodes
/// as an envelope and can be logged and skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Event name
    pub event: String,

    /// Event payload
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl GatewayMessage {
    /// Create a message for a known event
    #[must_use]
    pub fn new(event: EventName, data: Value) -> Self {
        Self {
            event: event.as_str().to_string(),
            data,
        }
    }

    /// Known event name of this message
    pub fn event_name(&self) -> Result<EventName, ProtocolError> {
        EventName::parse(&self.event)
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON text frame
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode the payload into a typed value
    pub fn decode_data<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone()).map_err(|source| ProtocolError::InvalidPayload {
            event: self.event.clone(),
            source,
        })
    }
}

impl fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.event)
    }
}
