//! Configuration for bearer credential validation

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that overrides the configured signing secret
pub const SECRET_ENV_VAR: &str = "STOREHUB_JWT_SECRET";

/// Configuration for HS256 JWT validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared signing secret
    #[serde(default)]
    pub secret: String,

    /// Expected `iss` claim; not checked when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Clock skew leeway in seconds for token expiry validation
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

fn default_leeway() -> u64 {
    30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: None,
            leeway_seconds: default_leeway(),
        }
    }
}

impl AuthConfig {
    /// Create a new AuthConfig with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Require tokens to carry this issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Apply the secret from the environment, if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var(SECRET_ENV_VAR)
            && !secret.is_empty()
        {
            self.secret = secret;
        }
        self
    }

    /// Fail fast when no secret is configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Missing("auth.secret".to_string()));
        }
        Ok(())
    }
}
