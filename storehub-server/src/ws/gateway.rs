//! Connection gateway
//!
//! Turns one authenticated WebSocket request into exactly one registered
//! session, drives its receive loop, and deregisters it on every exit path.
//!
//! Each connection runs two tasks: the receive loop (this handler) and a
//! writer task that owns the socket sink and drains the session's outbound
//! queue. Kicks and broadcasts from other tasks only ever touch the queue.

use std::sync::Arc;

use axum::Json;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use storehub_core::{
    AuthError, ClientMessage, NewSession, OutboundQueue, ServerMessage, Session, SessionId,
    SessionManager, SessionTransport, extract_bearer, session::DEFAULT_OUTBOUND_CAPACITY,
};
use tracing::{debug, info, warn};

use crate::AppState;

/// Query parameters accepted on `/ws`
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Bearer token, for clients that cannot set headers
    #[serde(default)]
    pub token: Option<String>,
    /// Client-chosen device label
    #[serde(default)]
    pub device_id: Option<String>,
}

/// WebSocket upgrade handler
///
/// The credential is checked before the upgrade is accepted, so a rejected
/// request never opens a transport or touches the registry.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Response {
    let credential = match credential_from_request(&headers, query.token.as_deref()) {
        Ok(credential) => credential.to_string(),
        Err(e) => return reject(e),
    };

    let claims = match state.verifier.validate(&credential).await {
        Ok(claims) => claims,
        Err(e) => return reject(e),
    };

    let request =
        NewSession::new(claims.user_id, credential, claims.expires_at).with_device(query.device_id);

    ws.on_upgrade(move |socket| handle_socket(socket, state, request))
}

/// Pick the credential from the `Authorization` header, falling back to `?token=`
fn credential_from_request<'a>(
    headers: &'a HeaderMap,
    query_token: Option<&'a str>,
) -> Result<&'a str, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::Malformed("non-ASCII authorization header".to_string()))?;
        return extract_bearer(Some(value));
    }

    match query_token.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        Some(_) => Err(AuthError::Malformed("empty token".to_string())),
        None => Err(AuthError::MissingToken),
    }
}

fn reject(error: AuthError) -> Response {
    debug!("Rejected connection: {}", error);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}

/// Why a connection's receive loop stopped
#[derive(Debug)]
enum LoopExit {
    /// Client sent a close frame or the stream ended
    PeerClosed,
    /// The transport was closed by a kick or eviction
    TransportClosed,
    /// Reading from the socket failed
    ReadError(String),
    /// The outbound queue rejected a reply
    SendFailed(String),
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, request: NewSession) {
    let (sink, stream) = socket.split();
    let (transport, outbound) = SessionTransport::channel(DEFAULT_OUTBOUND_CAPACITY);
    let writer = tokio::spawn(write_loop(sink, outbound));

    let registration = match state
        .session_manager
        .create_session(request, transport.clone())
        .await
    {
        Ok(registration) => registration,
        Err(e) => {
            warn!("Session registration failed: {}", e);
            if let Err(send_err) = transport.send(ServerMessage::Error {
                message: e.to_string(),
            }) {
                debug!("error notice not queued: {}", send_err);
            }
            transport.close();
            let _ = writer.await;
            return;
        }
    };

    for evicted in &registration.evicted {
        evicted.kick(registration.eviction_reason);
    }

    let session = registration.session;
    let guard = RegistrationGuard::new(Arc::clone(&state.session_manager), session.id());

    info!(
        session_id = %session.id(),
        user_id = %session.user_id(),
        "WebSocket client connected"
    );

    let exit = match session.send(ServerMessage::Connected {
        session_id: session.id().to_string(),
    }) {
        Ok(()) => receive_loop(stream, &session).await,
        Err(e) => LoopExit::SendFailed(e.to_string()),
    };

    info!(session_id = %session.id(), ?exit, "WebSocket client disconnected");

    transport.close();
    guard.release().await;
    let _ = writer.await;
}

/// Read client frames until the peer leaves or the transport is closed
async fn receive_loop(mut stream: SplitStream<WebSocket>, session: &Session) -> LoopExit {
    loop {
        let frame = tokio::select! {
            _ = session.transport().closed() => return LoopExit::TransportClosed,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                let reply = match ClientMessage::parse(&text) {
                    ClientMessage::Ping => ServerMessage::Pong,
                    ClientMessage::Other(payload) => ServerMessage::Echo(payload),
                };
                if let Err(e) = session.send(reply) {
                    return LoopExit::SendFailed(e.to_string());
                }
            }
            Some(Ok(Message::Close(_))) | None => return LoopExit::PeerClosed,
            Some(Ok(Message::Binary(_))) => {
                debug!(session_id = %session.id(), "Ignoring binary frame");
            }
            Some(Ok(_)) => {
                // Ping/pong frames are answered by the websocket layer
            }
            Some(Err(e)) => return LoopExit::ReadError(e.to_string()),
        }
    }
}

/// Sole writer for a connection's socket
async fn write_loop(mut sink: SplitSink<WebSocket, Message>, mut outbound: OutboundQueue) {
    while let Some(message) = outbound.next().await {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize outbound message: {}", e);
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(json.into())).await {
            debug!("WebSocket send failed: {}", e);
            outbound.close();
            return;
        }
    }

    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
}

/// Deregisters a session exactly once
///
/// The normal path calls [`release`](Self::release). If the connection task
/// unwinds before that, the drop impl schedules the removal instead.
struct RegistrationGuard {
    pending: Option<(Arc<SessionManager>, SessionId)>,
}

impl RegistrationGuard {
    fn new(manager: Arc<SessionManager>, session_id: &str) -> Self {
        Self {
            pending: Some((manager, session_id.to_string())),
        }
    }

    async fn release(mut self) {
        if let Some((manager, session_id)) = self.pending.take() {
            remove(&manager, &session_id).await;
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if let Some((manager, session_id)) = self.pending.take()
            && let Ok(handle) = tokio::runtime::Handle::try_current()
        {
            handle.spawn(async move { remove(&manager, &session_id).await });
        }
    }
}

async fn remove(manager: &SessionManager, session_id: &str) {
    match manager.remove_session(session_id).await {
        Ok(true) => debug!(session_id, "Deregistered session"),
        // Already detached by an eviction or kick
        Ok(false) => {}
        Err(e) => warn!(session_id, "Failed to deregister session: {}", e),
    }
}
