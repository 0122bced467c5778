//! storehub-core: live session registry for the storehub backend
//!
//! This crate provides the building blocks that the connection gateway drives:
//!
//! - **Session management** - [`Session`] and [`SessionManager`] track every live,
//!   authenticated duplex connection per user
//! - **Login policy** - [`SessionPolicy`] enforces single-session or capped
//!   multi-session logins with deterministic eviction
//! - **Transport handle** - [`SessionTransport`] serializes all outbound writes for a
//!   session through one queue
//! - **Wire protocol** - [`ServerMessage`] and [`ClientMessage`] over the JSON
//!   [`Envelope`]
//! - **Authentication** - [`CredentialVerifier`] and the HS256 [`JwtVerifier`]
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use storehub_core::{NewSession, SessionManager, SessionPolicy, SessionTransport};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = SessionManager::new();
//!     manager.init(SessionPolicy::Single)?;
//!
//!     let (transport, _outbound) = SessionTransport::channel(16);
//!     let registration = manager
//!         .create_session(
//!             NewSession::new("user-1", "token", Utc::now() + Duration::hours(1)),
//!             transport,
//!         )
//!         .await?;
//!
//!     println!("registered {}", registration.session.id());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 SessionManager                   │
//! │  by_user: user_id ──► UserSessions               │
//! │             (created_at, seq) ──► Arc<Session>   │
//! │  by_id:   session_id ──► user_id                 │
//! └──────────────────────────────────────────────────┘
//!              │ owns
//!              ▼
//!   Session ──► SessionTransport ──► outbound queue ──► writer task
//! ```

pub mod auth;
pub mod error;
pub mod protocol;
pub mod session;

// Re-export key types for convenience
pub use auth::{AuthConfig, AuthError, Claims, CredentialVerifier, JwtVerifier, extract_bearer};
pub use error::{ConfigError, SessionError, TransportError};
pub use protocol::{ClientMessage, Envelope, ServerMessage};
pub use session::{
    DEFAULT_DEVICE_ID, LoginStrategy, NewSession, OutboundQueue, Registration, Session,
    SessionConfig, SessionId, SessionInfo, SessionManager, SessionPolicy, SessionTransport, UserId,
};
