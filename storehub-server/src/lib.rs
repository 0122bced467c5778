//! storehub-server - HTTP and WebSocket server for live store sessions
//!
//! This crate hosts the connection gateway (`/ws`) that authenticates clients
//! and registers them with the [`SessionManager`](storehub_core::SessionManager),
//! plus a small admin API for listing, kicking, and notifying sessions.

mod error;
pub mod http;
pub mod middleware;
mod state;
pub mod ws;

use std::sync::Arc;

use storehub_core::{AuthConfig, SessionConfig};
use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// Default host for the storehub server
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for the storehub server
pub const DEFAULT_PORT: u16 = 7800;

/// The main storehub server
pub struct StorehubServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl StorehubServer {
    /// Create a server from configuration
    ///
    /// Fails fast on an invalid login policy or missing signing secret.
    pub fn new(
        config: ServerConfig,
        session: &SessionConfig,
        auth: AuthConfig,
    ) -> Result<Self, ServerError> {
        let state = Arc::new(AppState::from_config(session, auth)?);
        Ok(Self { config, state })
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("storehub server listening on {}", addr);

        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let router = create_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:7800")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
