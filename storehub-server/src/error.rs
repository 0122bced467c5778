//! Server error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storehub_core::{AuthError, ConfigError, SessionError};
use thiserror::Error;

/// Errors that can occur in the storehub server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid startup configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session registry failure
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Credential rejected
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Credential valid but lacking the required role
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error when returned from a handler
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Session(SessionError::Uninitialized) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
