//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::middleware::admin_auth;
use crate::ws;

pub use api::{
    DEFAULT_KICK_REASON, HealthResponse, KickResponse, NotifyResponse, SessionListResponse,
};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route(
            "/api/users/:user_id/sessions",
            get(api::list_user_sessions).delete(api::kick_user),
        )
        .route("/api/users/:user_id/notify", post(api::notify_user))
        .route("/api/sessions/:session_id", delete(api::kick_session))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            admin_auth,
        ));

    Router::new()
        .route("/api/health", get(api::health))
        .route("/ws", get(ws::ws_handler))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use storehub_core::auth::TokenClaims;
    use storehub_core::{
        AuthConfig, CredentialVerifier, JwtVerifier, NewSession, ServerMessage, Session,
        SessionConfig, SessionManager, SessionTransport,
    };

    const SECRET: &str = "router-test-secret";

    fn test_state(session: SessionConfig) -> Arc<AppState> {
        Arc::new(AppState::from_config(&session, AuthConfig::new(SECRET)).unwrap())
    }

    fn token(user_id: &str, admin: bool) -> String {
        let mut claims = TokenClaims::new(user_id, Utc::now() + Duration::hours(1));
        if admin {
            claims = claims.with_role("admin");
        }
        JwtVerifier::new(AuthConfig::new(SECRET))
            .sign(&claims)
            .unwrap()
    }

    fn bearer(user_id: &str, admin: bool) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token(user_id, admin))).unwrap()
    }

    async fn register_session(
        state: &AppState,
        user_id: &str,
    ) -> (Arc<Session>, storehub_core::OutboundQueue) {
        let (transport, queue) = SessionTransport::channel(8);
        let registration = state
            .session_manager
            .create_session(
                NewSession::new(user_id, "tok", Utc::now() + Duration::hours(1)),
                transport,
            )
            .await
            .unwrap();
        (registration.session, queue)
    }

    async fn register(state: &AppState, user_id: &str) -> storehub_core::OutboundQueue {
        register_session(state, user_id).await.1
    }

    #[tokio::test]
    async fn test_router_has_health_endpoint() {
        let state = test_state(SessionConfig::multi(2));
        let server = TestServer::new(create_router(state)).unwrap();

        let response = server.get("/api/health").await;
        response.assert_status_ok();

        let health: HealthResponse = response.json();
        assert_eq!(health.status, "ok");
        assert_eq!(health.strategy.as_deref(), Some("multi"));
        assert_eq!(health.active_sessions, 0);
    }

    #[tokio::test]
    async fn test_health_reports_uninitialized() {
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(JwtVerifier::new(AuthConfig::new(SECRET)));
        let state = Arc::new(AppState::with_components(
            Arc::new(SessionManager::new()),
            verifier,
        ));
        let server = TestServer::new(create_router(state)).unwrap();

        let health: HealthResponse = server.get("/api/health").await.json();
        assert_eq!(health.status, "uninitialized");
        assert!(health.strategy.is_none());
    }

    #[tokio::test]
    async fn test_admin_routes_require_credential() {
        let server = TestServer::new(create_router(test_state(SessionConfig::single()))).unwrap();

        server
            .get("/api/users/u1/sessions")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_role() {
        let server = TestServer::new(create_router(test_state(SessionConfig::single()))).unwrap();

        server
            .get("/api/users/u1/sessions")
            .add_header(AUTHORIZATION, bearer("cashier", false))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_user_sessions() {
        let state = test_state(SessionConfig::multi(3));
        let _q1 = register(&state, "u1").await;
        let _q2 = register(&state, "u1").await;
        let server = TestServer::new(create_router(state)).unwrap();

        let response = server
            .get("/api/users/u1/sessions")
            .add_header(AUTHORIZATION, bearer("root", true))
            .await;
        response.assert_status_ok();

        let list: SessionListResponse = response.json();
        assert_eq!(list.sessions.len(), 2);
        assert!(list.sessions.iter().all(|s| s.user_id == "u1"));
    }

    #[tokio::test]
    async fn test_kick_user_defaults_reason() {
        let state = test_state(SessionConfig::multi(3));
        let mut q1 = register(&state, "u1").await;
        let server = TestServer::new(create_router(Arc::clone(&state))).unwrap();

        let response = server
            .delete("/api/users/u1/sessions")
            .add_header(AUTHORIZATION, bearer("root", true))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<KickResponse>().kicked, 1);

        assert_eq!(
            q1.next().await,
            Some(ServerMessage::Kick {
                reason: DEFAULT_KICK_REASON.to_string()
            })
        );
        assert_eq!(state.session_manager.session_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_kick_session_removes_only_that_session() {
        let state = test_state(SessionConfig::multi(3));
        let (target, mut target_queue) = register_session(&state, "u1").await;
        let (survivor, _survivor_queue) = register_session(&state, "u1").await;
        let server = TestServer::new(create_router(Arc::clone(&state))).unwrap();

        let response = server
            .delete(&format!("/api/sessions/{}", target.id()))
            .add_query_param("reason", "till closed")
            .add_header(AUTHORIZATION, bearer("root", true))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<KickResponse>().kicked, 1);

        assert_eq!(
            target_queue.next().await,
            Some(ServerMessage::Kick {
                reason: "till closed".to_string()
            })
        );
        assert_eq!(target_queue.next().await, None);

        let live = state.session_manager.list_user_sessions("u1").await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id(), survivor.id());
        assert!(!survivor.is_closed());
    }

    #[tokio::test]
    async fn test_admin_route_on_uninitialized_manager_is_unavailable() {
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(JwtVerifier::new(AuthConfig::new(SECRET)));
        let state = Arc::new(AppState::with_components(
            Arc::new(SessionManager::new()),
            verifier,
        ));
        let server = TestServer::new(create_router(state)).unwrap();

        let response = server
            .get("/api/users/u1/sessions")
            .add_header(AUTHORIZATION, bearer("root", true))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("not initialized"));
    }

    #[tokio::test]
    async fn test_kick_unknown_session_is_not_found() {
        let server = TestServer::new(create_router(test_state(SessionConfig::single()))).unwrap();

        server
            .delete("/api/sessions/does-not-exist")
            .add_header(AUTHORIZATION, bearer("root", true))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notify_user_counts_deliveries() {
        let state = test_state(SessionConfig::multi(3));
        let mut q1 = register(&state, "u1").await;
        let _q2 = register(&state, "u1").await;
        let server = TestServer::new(create_router(state)).unwrap();

        let response = server
            .post("/api/users/u1/notify")
            .add_header(AUTHORIZATION, bearer("root", true))
            .json(&serde_json::json!({ "order_id": 17 }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<NotifyResponse>().delivered, 2);

        assert_eq!(
            q1.next().await,
            Some(ServerMessage::Notify(serde_json::json!({ "order_id": 17 })))
        );
    }
}
