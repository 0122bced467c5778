//! Wire protocol for session connections
//!
//! Every frame is a JSON [`Envelope`]:
//!
//! ```text
//! { "type": "<string>", "payload": <any, optional>, "ts": <unix seconds> }
//! ```
//!
//! The string discriminator only exists on the wire. Inside the process,
//! outbound frames are [`ServerMessage`] and inbound frames are [`ClientMessage`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JSON frame exchanged with clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type discriminator
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Message body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Unix timestamp (seconds) when the frame was produced
    #[serde(default)]
    pub ts: i64,
}

impl Envelope {
    /// Create an envelope stamped with the current time
    pub fn new(msg_type: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload,
            ts: Utc::now().timestamp(),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Registration acknowledgment carrying the new session id
    Connected { session_id: String },
    /// The session was evicted or kicked and is about to be closed
    Kick { reason: String },
    /// Reply to a client ping
    Pong,
    /// Any non-ping client payload, sent back unchanged
    Echo(Value),
    /// Connection-level failure
    Error { message: String },
    /// Server-initiated push to every session of a user
    Notify(Value),
}

impl ServerMessage {
    /// Wire discriminator for this message
    pub fn msg_type(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::Kick { .. } => "kick",
            ServerMessage::Pong => "pong",
            ServerMessage::Echo(_) => "echo",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Notify(_) => "notify",
        }
    }

    /// Convert into a timestamped envelope
    pub fn into_envelope(self) -> Envelope {
        let msg_type = self.msg_type();
        let payload = match self {
            ServerMessage::Connected { session_id } => Some(json!({ "session_id": session_id })),
            ServerMessage::Kick { reason } => Some(json!({ "reason": reason })),
            ServerMessage::Pong => None,
            ServerMessage::Echo(payload) | ServerMessage::Notify(payload) => Some(payload),
            ServerMessage::Error { message } => Some(json!({ "message": message })),
        };
        Envelope::new(msg_type, payload)
    }

    /// Serialize to a JSON text frame
    pub fn to_json(self) -> serde_json::Result<String> {
        serde_json::to_string(&self.into_envelope())
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Liveness probe, answered with [`ServerMessage::Pong`]
    Ping,
    /// Anything else; the payload is opaque to the gateway
    Other(Value),
}

impl ClientMessage {
    /// Classify a raw text frame by its `type` field alone
    ///
    /// A JSON object with a string `type` is an envelope; its other fields are
    /// not validated. Any other JSON value is the payload itself, and text that
    /// is not JSON becomes an opaque string payload.
    pub fn parse(text: &str) -> Self {
        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(_) => return ClientMessage::Other(Value::String(text.to_string())),
        };

        match value.get("type").and_then(Value::as_str) {
            Some("ping") => ClientMessage::Ping,
            Some(_) => ClientMessage::Other(value.get("payload").cloned().unwrap_or(Value::Null)),
            None => ClientMessage::Other(value),
        }
    }
}
