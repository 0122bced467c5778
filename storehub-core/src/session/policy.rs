//! Login-concurrency policy
//!
//! [`SessionConfig`] is the raw `[session]` table as configured; [`SessionPolicy`]
//! is the validated form the manager runs with. Validation happens once, at
//! startup, so a bad strategy never reaches the connection path.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Kick reason sent to sessions displaced under the single strategy
pub const REASON_REPLACED: &str = "replaced";

/// Kick reason sent to the oldest session evicted under the multi strategy
pub const REASON_SESSION_LIMIT: &str = "session_limit";

/// Which login strategy to enforce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStrategy {
    /// One live session per user; a new login replaces all others
    Single,
    /// Up to `max_sessions` live sessions per user; the oldest is evicted
    Multi,
}

impl FromStr for LoginStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(LoginStrategy::Single),
            "multi" => Ok(LoginStrategy::Multi),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for LoginStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStrategy::Single => write!(f, "single"),
            LoginStrategy::Multi => write!(f, "multi"),
        }
    }
}

/// `[session]` configuration section as written by operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// "single" or "multi"
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Per-user cap, required when strategy is "multi"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<i64>,
}

fn default_strategy() -> String {
    LoginStrategy::Single.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            max_sessions: None,
        }
    }
}

impl SessionConfig {
    /// Single-session configuration
    pub fn single() -> Self {
        Self::default()
    }

    /// Multi-session configuration with the given cap
    pub fn multi(max_sessions: i64) -> Self {
        Self {
            strategy: LoginStrategy::Multi.to_string(),
            max_sessions: Some(max_sessions),
        }
    }
}

/// Validated login policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    Single,
    Multi { max_sessions: NonZeroUsize },
}

impl SessionPolicy {
    /// Validate a configuration section
    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        match config.strategy.parse::<LoginStrategy>()? {
            LoginStrategy::Single => Ok(SessionPolicy::Single),
            LoginStrategy::Multi => {
                let max_sessions = config
                    .max_sessions
                    .filter(|n| *n > 0)
                    .and_then(|n| usize::try_from(n).ok())
                    .and_then(NonZeroUsize::new)
                    .ok_or(ConfigError::InvalidMaxSessions(config.max_sessions))?;
                Ok(SessionPolicy::Multi { max_sessions })
            }
        }
    }

    /// Multi-session policy with a cap
    pub fn multi(max_sessions: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(max_sessions)
            .map(|max_sessions| SessionPolicy::Multi { max_sessions })
            .ok_or(ConfigError::InvalidMaxSessions(Some(max_sessions as i64)))
    }

    /// The strategy this policy enforces
    pub fn strategy(&self) -> LoginStrategy {
        match self {
            SessionPolicy::Single => LoginStrategy::Single,
            SessionPolicy::Multi { .. } => LoginStrategy::Multi,
        }
    }

    /// Kick reason for sessions evicted by a new login
    pub fn eviction_reason(&self) -> &'static str {
        match self {
            SessionPolicy::Single => REASON_REPLACED,
            SessionPolicy::Multi { .. } => REASON_SESSION_LIMIT,
        }
    }
}
