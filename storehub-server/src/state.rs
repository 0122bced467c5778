//! Shared application state for the storehub server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use storehub_core::{
    AuthConfig, CredentialVerifier, JwtVerifier, SessionConfig, SessionManager, SessionPolicy,
};

use crate::ServerError;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry of live sessions
    pub session_manager: Arc<SessionManager>,
    /// Validates bearer credentials on connect and on admin calls
    pub verifier: Arc<dyn CredentialVerifier>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state from configuration, failing fast on invalid settings
    pub fn from_config(session: &SessionConfig, auth: AuthConfig) -> Result<Self, ServerError> {
        let policy = SessionPolicy::from_config(session)?;
        auth.validate()?;

        let session_manager = Arc::new(SessionManager::new());
        session_manager.init(policy)?;

        Ok(Self::with_components(
            session_manager,
            Arc::new(JwtVerifier::new(auth)),
        ))
    }

    /// Create AppState with custom components (for testing)
    pub fn with_components(
        session_manager: Arc<SessionManager>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            session_manager,
            verifier,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
