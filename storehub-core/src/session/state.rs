//! Session entity
//!
//! A Session is one live, authenticated connection: who owns it, which device
//! opened it, the credential that let it in, and the transport used to reach it.
//! Everything except the transport is immutable after registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::ServerMessage;

use super::transport::SessionTransport;

/// Opaque, process-unique session identifier
pub type SessionId = String;

/// Owning user identifier
pub type UserId = String;

/// Device label used when the client does not supply one
pub const DEFAULT_DEVICE_ID: &str = "unknown";

/// Registration request for a new session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub device_id: String,
    pub credential: String,
    pub expires_at: DateTime<Utc>,
}

impl NewSession {
    /// Create a request for the default device
    pub fn new(
        user_id: impl Into<UserId>,
        credential: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            credential: credential.into(),
            expires_at,
        }
    }

    /// Set the device label; empty labels fall back to the default
    pub fn with_device(mut self, device_id: Option<impl Into<String>>) -> Self {
        self.device_id = device_id
            .map(Into::into)
            .filter(|d: &String| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string());
        self
    }
}

/// A live connection registered with the [`SessionManager`](super::SessionManager)
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    device_id: String,
    credential: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    /// Registration order, breaks ties between equal `created_at` values
    seq: u64,
    transport: SessionTransport,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        request: NewSession,
        created_at: DateTime<Utc>,
        seq: u64,
        transport: SessionTransport,
    ) -> Self {
        Self {
            id,
            user_id: request.user_id,
            device_id: request.device_id,
            credential: request.credential,
            expires_at: request.expires_at,
            created_at,
            seq,
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Credential that authorized this session (audit only)
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Eviction ordering key; smaller is older
    pub(crate) fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }

    pub fn transport(&self) -> &SessionTransport {
        &self.transport
    }

    /// Queue a message for this session
    pub fn send(&self, message: ServerMessage) -> Result<(), TransportError> {
        self.transport.send(message)
    }

    /// Notify the client why it is being dropped, then close the transport
    ///
    /// Safe to call on an already closed session.
    pub fn kick(&self, reason: &str) {
        if let Err(e) = self.transport.send(ServerMessage::Kick {
            reason: reason.to_string(),
        }) {
            debug!(session_id = %self.id, "kick notice not queued: {}", e);
        }
        self.transport.close();
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Serializable view without the credential or transport
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            device_id: self.device_id.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Summary of a live session for admin views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub user_id: UserId,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
