use serde::{Deserialize, Serialize};
use storehub_core::{AuthConfig, SessionConfig};
use storehub_server::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};

/// Default clock skew leeway for token expiry
pub const DEFAULT_LEEWAY_SECONDS: u64 = 30;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorehubConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub session: RawSessionConfig,

    #[serde(default)]
    pub auth: RawAuthConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Host address to bind to
    pub host: Option<String>,

    /// Port for the storehub server
    pub port: Option<u16>,
}

/// Login policy as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSessionConfig {
    /// "single" or "multi"
    pub strategy: Option<String>,

    /// Session cap per user for "multi"
    pub max_sessions: Option<i64>,
}

/// Token validation settings as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthConfig {
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub leeway_seconds: Option<u64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorehubConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Host address to bind to
    pub host: String,

    /// Port for the storehub server
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    /// Shared signing secret; STOREHUB_JWT_SECRET takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Expected token issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Clock skew leeway in seconds
    pub leeway_seconds: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: None,
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
        }
    }
}

impl StorehubConfig {
    /// Bind address for the server
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.server.host.clone(), self.server.port)
    }

    /// Token validation settings, with the environment secret applied
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            secret: self.auth.secret.clone().unwrap_or_default(),
            issuer: self.auth.issuer.clone(),
            leeway_seconds: self.auth.leeway_seconds,
        }
        .with_env_overrides()
    }

    /// Copy safe to print, with the secret masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.auth.secret.is_some() {
            config.auth.secret = Some("********".to_string());
        }
        config
    }
}
