//! WebSocket test client for gateway testing
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect with the token in the query string
    pub async fn connect(addr: SocketAddr, token: &str, device_id: Option<&str>) -> Self {
        let url = match device_id {
            Some(device) => format!("ws://{}/ws?token={}&device_id={}", addr, token, device),
            None => format!("ws://{}/ws?token={}", addr, token),
        };
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("Failed to connect");
        Self::from_stream(ws)
    }

    /// Connect with the token in an `Authorization: Bearer` header
    #[allow(dead_code)]
    pub async fn connect_with_header(addr: SocketAddr, token: &str) -> Self {
        let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
        request.headers_mut().insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .expect("Failed to connect");
        Self::from_stream(ws)
    }

    fn from_stream(ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Send raw text message
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Send JSON message
    #[allow(dead_code)]
    pub async fn send_json(&mut self, msg: &Value) {
        self.send_raw(&msg.to_string()).await;
    }

    /// Send a close frame
    #[allow(dead_code)]
    pub async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }

    /// Receive the next text frame, or None once the server closes
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return None,
            }
        }
    }

    /// Receive and parse the next envelope, failing on close or timeout
    pub async fn recv_json(&mut self) -> Value {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.next_text())
            .await
            .expect("Timed out waiting for message")
            .expect("Connection closed while waiting for message");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Assert the server closes the connection without sending more text
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self) {
        let next = tokio::time::timeout(RECV_TIMEOUT, self.next_text())
            .await
            .expect("Timed out waiting for close");
        assert!(next.is_none(), "Expected close but received {:?}", next);
    }

    /// Assert no message arrives within duration
    #[allow(dead_code)]
    pub async fn expect_no_message(&mut self, duration: Duration) {
        let next = tokio::time::timeout(duration, self.next_text()).await;
        assert!(next.is_err(), "Expected no message but received {:?}", next);
    }
}

/// Gateway client that has completed registration
pub struct TestClient {
    pub conn: WsConnection,
    pub session_id: String,
}

impl TestClient {
    /// Connect and consume the `connected` acknowledgment
    pub async fn connect(addr: SocketAddr, token: &str) -> Self {
        Self::connect_device(addr, token, None).await
    }

    /// Connect with a device label and consume the `connected` acknowledgment
    pub async fn connect_device(addr: SocketAddr, token: &str, device_id: Option<&str>) -> Self {
        let conn = WsConnection::connect(addr, token, device_id).await;
        Self::registered(conn).await
    }

    /// Wait for the `connected` acknowledgment on an open connection
    pub async fn registered(mut conn: WsConnection) -> Self {
        let ack = conn.recv_json().await;
        assert_eq!(ack["type"], "connected", "Expected connected but got: {}", ack);
        let session_id = ack["payload"]["session_id"]
            .as_str()
            .expect("connected carries a session id")
            .to_string();
        Self { conn, session_id }
    }

    /// Receive next envelope
    pub async fn recv(&mut self) -> Value {
        self.conn.recv_json().await
    }

    /// Assert the next envelope is a kick with `reason`, followed by close
    #[allow(dead_code)]
    pub async fn expect_kicked(&mut self, reason: &str) {
        let msg = self.recv().await;
        assert_eq!(msg["type"], "kick", "Expected kick but got: {}", msg);
        assert_eq!(msg["payload"]["reason"], reason);
        self.conn.expect_closed().await;
    }
}

/// Attempt a connection that the server is expected to refuse
///
/// Returns the HTTP status of the rejected handshake.
#[allow(dead_code)]
pub async fn rejected_status(addr: SocketAddr, query: &str) -> StatusCode {
    let url = format!("ws://{}/ws{}", addr, query);
    match tokio_tungstenite::connect_async(url).await {
        Err(WsError::Http(response)) => response.status(),
        Err(e) => panic!("Expected HTTP rejection, got {}", e),
        Ok(_) => panic!("Expected handshake to be rejected"),
    }
}
