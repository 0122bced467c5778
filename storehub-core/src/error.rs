//! Error types for storehub-core

use thiserror::Error;

/// Errors related to session management
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session manager is not initialized")]
    Uninitialized,

    #[error("Session manager is already initialized")]
    AlreadyInitialized,

    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Invalid login-policy or server configuration, detected at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown login strategy '{0}' (expected 'single' or 'multi')")]
    UnknownStrategy(String),

    #[error("max_sessions must be a positive integer for the multi strategy, got {0:?}")]
    InvalidMaxSessions(Option<i64>),

    #[error("missing required setting: {0}")]
    Missing(String),
}

/// Errors writing to a single session's transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("outbound queue is full")]
    Full,
}
