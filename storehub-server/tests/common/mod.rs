//! Shared test utilities for storehub-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use storehub_core::auth::TokenClaims;
use storehub_core::{
    AuthConfig, CredentialVerifier, JwtVerifier, SessionConfig, SessionManager,
};
use storehub_server::{AppState, ServerConfig, StorehubServer};
use tokio::net::TcpListener;

/// Signing secret shared by every test server
pub const TEST_SECRET: &str = "integration-test-secret";

/// Creates a test server with the given login policy, returns state and address
#[allow(dead_code)]
pub async fn create_test_server(session: SessionConfig) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::from_config(&session, AuthConfig::new(TEST_SECRET)).unwrap());
    let addr = spawn_server(Arc::clone(&state)).await;
    (state, addr)
}

/// Creates a test server whose session manager was never initialized
#[allow(dead_code)]
pub async fn create_uninitialized_server() -> (Arc<AppState>, SocketAddr) {
    let verifier: Arc<dyn CredentialVerifier> =
        Arc::new(JwtVerifier::new(AuthConfig::new(TEST_SECRET)));
    let state = Arc::new(AppState::with_components(
        Arc::new(SessionManager::new()),
        verifier,
    ));
    let addr = spawn_server(Arc::clone(&state)).await;
    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = StorehubServer::with_state(ServerConfig::default(), state);
    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(Duration::from_millis(10)).await;

    addr
}

/// Mint a token for `user_id` valid for one hour
#[allow(dead_code)]
pub fn token_for(user_id: &str) -> String {
    sign(TokenClaims::new(user_id, Utc::now() + chrono::Duration::hours(1)))
}

/// Mint an admin token
#[allow(dead_code)]
pub fn admin_token() -> String {
    sign(TokenClaims::new("ops", Utc::now() + chrono::Duration::hours(1)).with_role("admin"))
}

/// Mint a token that expired an hour ago, outside the default leeway
#[allow(dead_code)]
pub fn expired_token_for(user_id: &str) -> String {
    sign(TokenClaims::new(user_id, Utc::now() - chrono::Duration::hours(1)))
}

fn sign(claims: TokenClaims) -> String {
    JwtVerifier::new(AuthConfig::new(TEST_SECRET))
        .sign(&claims)
        .unwrap()
}

/// Poll until the manager holds `expected` sessions for `user_id`
#[allow(dead_code)]
pub async fn wait_for_user_sessions(state: &AppState, user_id: &str, expected: usize) {
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let count = state
                .session_manager
                .list_user_sessions(user_id)
                .await
                .unwrap()
                .len();
            if count == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(
        result.is_ok(),
        "timed out waiting for {} sessions of {}",
        expected,
        user_id
    );
}
