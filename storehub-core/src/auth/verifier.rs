//! Bearer credential verification
//!
//! The gateway only depends on [`CredentialVerifier`]; [`JwtVerifier`] is the
//! production implementation for HS256 tokens minted by the login service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, AuthError, Claims};

/// Validates an opaque bearer credential
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Validate the credential and return the identity it carries
    async fn validate(&self, credential: &str) -> Result<Claims, AuthError>;
}

/// Extract the token from an `Authorization` header value
///
/// Only the `Bearer` scheme is accepted (case-insensitive).
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::Malformed("expected 'Bearer <token>'".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed(format!("unsupported scheme '{}'", scheme)));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed("empty bearer token".to_string()));
    }
    Ok(token)
}

/// JWT claims as encoded in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl TokenClaims {
    /// Claims for `sub` valid until `expires_at`
    pub fn new(sub: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: sub.into(),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
            iss: None,
            tenant_id: None,
            roles: Vec::new(),
        }
    }

    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

/// HS256 JWT verifier
pub struct JwtVerifier {
    config: AuthConfig,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
}

impl JwtVerifier {
    /// Create a new JwtVerifier with the given configuration
    pub fn new(config: AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            decoding_key,
            encoding_key,
        }
    }

    /// Sign a token with the configured secret
    ///
    /// Tokens are normally minted by the login service; this exists for
    /// development tooling and tests.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        let claims = token_data.claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Malformed(format!("invalid exp {}", claims.exp)))?;

        let mut identity = Claims::new(claims.sub, expires_at);
        if let Some(tenant_id) = claims.tenant_id {
            identity = identity.with_tenant(tenant_id);
        }
        identity.roles = claims.roles;

        Ok(identity)
    }

    /// Get the configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn validate(&self, credential: &str) -> Result<Claims, AuthError> {
        self.decode(credential)
    }
}
