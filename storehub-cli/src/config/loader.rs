use super::types::{
    AuthSection, DEFAULT_LEEWAY_SECONDS, RawAuthConfig, RawServerConfig, RawSessionConfig,
    RawStorehubConfig, ServerSection, StorehubConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use storehub_core::SessionConfig;
use storehub_server::{DEFAULT_HOST, DEFAULT_PORT};

/// Overrides the project config directory (useful for isolated tests)
pub const PROJECT_CONFIG_DIR_ENV: &str = "STOREHUB_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<StorehubConfig> {
        let mut raw = RawStorehubConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawStorehubConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "storehub").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with STOREHUB_PROJECT_CONFIG_DIR
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".storehub/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawStorehubConfig, overlay: RawStorehubConfig) -> RawStorehubConfig {
        RawStorehubConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            session: RawSessionConfig {
                strategy: overlay.session.strategy.or(base.session.strategy),
                max_sessions: overlay.session.max_sessions.or(base.session.max_sessions),
            },
            auth: RawAuthConfig {
                secret: overlay.auth.secret.or(base.auth.secret),
                issuer: overlay.auth.issuer.or(base.auth.issuer),
                leeway_seconds: overlay.auth.leeway_seconds.or(base.auth.leeway_seconds),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawStorehubConfig) -> StorehubConfig {
        let session_defaults = SessionConfig::default();
        StorehubConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            session: SessionConfig {
                strategy: raw.session.strategy.unwrap_or(session_defaults.strategy),
                max_sessions: raw.session.max_sessions,
            },
            auth: AuthSection {
                secret: raw.auth.secret.filter(|s| !s.is_empty()),
                issuer: raw.auth.issuer,
                leeway_seconds: raw.auth.leeway_seconds.unwrap_or(DEFAULT_LEEWAY_SECONDS),
            },
        }
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<StorehubConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(StorehubConfig::default())
        }
    }
}
