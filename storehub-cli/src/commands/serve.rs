//! Storehub serve command
//!
//! Runs the gateway server:
//! - WebSocket endpoint for store clients
//! - Admin HTTP API for listing, kicking, and notifying sessions

use anyhow::{Context, Result};
use clap::Args;
use storehub_server::StorehubServer;
use tracing::info;

use crate::config::{ConfigLoader, StorehubConfig};

/// Arguments for the serve command
///
/// Flags override values from the config files.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Login strategy ("single" or "multi")
    #[arg(long)]
    pub strategy: Option<String>,

    /// Per-user session cap for the multi strategy
    #[arg(long)]
    pub max_sessions: Option<i64>,
}

impl ServeArgs {
    /// Layer CLI flags over loaded configuration
    fn apply(&self, mut config: StorehubConfig) -> StorehubConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref strategy) = self.strategy {
            config.session.strategy = strategy.clone();
        }
        if self.max_sessions.is_some() {
            config.session.max_sessions = self.max_sessions;
        }
        config
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.apply(ConfigLoader::load()?);
    let server = build_server(&config)?;

    info!(
        "Starting storehub server on {} ({} login)",
        server.config().addr(),
        config.session.strategy
    );

    server.run().await.map_err(Into::into)
}

/// Validate configuration and construct the server
fn build_server(config: &StorehubConfig) -> Result<StorehubServer> {
    StorehubServer::new(
        config.server_config(),
        &config.session,
        config.auth_config(),
    )
    .context("Invalid server configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use storehub_core::SessionConfig;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn test_serve_args_defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.serve.port.is_none());
        assert!(cli.serve.host.is_none());
        assert!(cli.serve.strategy.is_none());
        assert!(cli.serve.max_sessions.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = TestCli::parse_from([
            "test",
            "--port",
            "9001",
            "--strategy",
            "multi",
            "--max-sessions",
            "4",
        ]);

        let config = cli.serve.apply(StorehubConfig::default());

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.session, SessionConfig::multi(4));
    }

    #[test]
    fn test_build_server_fails_fast_on_bad_policy() {
        let mut config = StorehubConfig::default();
        config.session = SessionConfig::multi(0);
        config.auth.secret = Some("secret".to_string());

        assert!(build_server(&config).is_err());
    }

    #[test]
    fn test_build_server_with_valid_config() {
        let mut config = StorehubConfig::default();
        config.auth.secret = Some("secret".to_string());

        let server = build_server(&config).unwrap();
        assert_eq!(server.config().port, config.server.port);
    }
}
