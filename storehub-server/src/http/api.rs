//! REST API handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storehub_core::{Claims, ServerMessage, SessionError, session::SessionInfo};
use tracing::info;

use crate::{AppState, ServerError};

/// Kick reason used when the caller does not give one
pub const DEFAULT_KICK_REASON: &str = "admin action";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Login strategy in force, if the registry is initialized
    pub strategy: Option<String>,
    /// Number of live sessions
    pub active_sessions: usize,
    /// Number of users with at least one live session
    pub active_users: usize,
}

/// Health check endpoint
///
/// Reports "uninitialized" rather than failing when the registry has no policy yet.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let manager = &state.session_manager;
    let (status, active_sessions, active_users) =
        match (manager.session_count().await, manager.user_count().await) {
            (Ok(sessions), Ok(users)) => ("ok", sessions, users),
            _ => ("uninitialized", 0, 0),
        };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        strategy: manager.policy().map(|p| p.strategy().to_string()),
        active_sessions,
        active_users,
    })
}

/// Response for listing sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    /// Live sessions, oldest first
    pub sessions: Vec<SessionInfo>,
}

/// List a user's live sessions
pub async fn list_user_sessions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionListResponse>, ServerError> {
    let sessions = state
        .session_manager
        .list_user_sessions(&user_id)
        .await?
        .iter()
        .map(|session| session.info())
        .collect();

    Ok(Json(SessionListResponse { sessions }))
}

/// Optional kick reason
#[derive(Debug, Default, Deserialize)]
pub struct KickQuery {
    #[serde(default)]
    pub reason: Option<String>,
}

impl KickQuery {
    fn reason(&self) -> &str {
        self.reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_KICK_REASON)
    }
}

/// Number of sessions a kick removed
#[derive(Debug, Serialize, Deserialize)]
pub struct KickResponse {
    pub kicked: usize,
}

/// Kick every session of a user
pub async fn kick_user(
    State(state): State<Arc<AppState>>,
    Extension(operator): Extension<Claims>,
    Path(user_id): Path<String>,
    Query(query): Query<KickQuery>,
) -> Result<Json<KickResponse>, ServerError> {
    let kicked = state
        .session_manager
        .kick_user(&user_id, query.reason())
        .await?;

    info!(
        %user_id,
        kicked,
        reason = query.reason(),
        operator = %operator.user_id,
        "Admin kicked user"
    );
    Ok(Json(KickResponse { kicked }))
}

/// Kick a single session
pub async fn kick_session(
    State(state): State<Arc<AppState>>,
    Extension(operator): Extension<Claims>,
    Path(session_id): Path<String>,
    Query(query): Query<KickQuery>,
) -> Result<Json<KickResponse>, ServerError> {
    let found = state
        .session_manager
        .kick_session(&session_id, query.reason())
        .await?;

    if !found {
        return Err(SessionError::NotFound(session_id).into());
    }

    info!(
        %session_id,
        reason = query.reason(),
        operator = %operator.user_id,
        "Admin kicked session"
    );
    Ok(Json(KickResponse { kicked: 1 }))
}

/// Number of sessions a notification reached
#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub delivered: usize,
}

/// Push a `notify` envelope to every session of a user
pub async fn notify_user(
    State(state): State<Arc<AppState>>,
    Extension(operator): Extension<Claims>,
    Path(user_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<NotifyResponse>, ServerError> {
    let delivered = state
        .session_manager
        .broadcast(&user_id, ServerMessage::Notify(payload))
        .await?;

    info!(%user_id, delivered, operator = %operator.user_id, "Admin notified user");
    Ok(Json(NotifyResponse { delivered }))
}
