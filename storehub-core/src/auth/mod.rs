//! Authentication module for bearer credential validation

mod claims;
mod config;
mod error;
mod verifier;

pub use claims::{ADMIN_ROLE, Claims};
pub use config::AuthConfig;
pub use error::AuthError;
pub use verifier::{CredentialVerifier, JwtVerifier, TokenClaims, extract_bearer};
