//! Authentication error types

use thiserror::Error;

/// Errors that can occur during authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// No authentication token was provided in the request
    #[error("no authentication token provided")]
    MissingToken,

    /// The credential is not a bearer token (or is empty)
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// The token has expired
    #[error("token has expired")]
    Expired,

    /// The token's issuer claim doesn't match the expected value
    #[error("invalid issuer claim")]
    InvalidIssuer,

    /// The token signature verification failed
    #[error("token signature verification failed")]
    InvalidSignature,

    /// JWT decoding error from jsonwebtoken crate
    #[error("JWT error: {0}")]
    JwtError(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::JwtError(err),
        }
    }
}
