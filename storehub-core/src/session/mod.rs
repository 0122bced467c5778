//! Session management

pub mod manager;
pub mod policy;
pub mod state;
pub mod transport;

// Re-export key types for convenience
pub use manager::{Registration, SessionManager};
pub use policy::{
    LoginStrategy, REASON_REPLACED, REASON_SESSION_LIMIT, SessionConfig, SessionPolicy,
};
pub use state::{DEFAULT_DEVICE_ID, NewSession, Session, SessionId, SessionInfo, UserId};
pub use transport::{DEFAULT_OUTBOUND_CAPACITY, OutboundQueue, SessionTransport};
