//! Outbound handle for a session's duplex connection
//!
//! The socket sink is owned by exactly one writer task. Everything else (the
//! gateway's receive loop, kicks, broadcasts) talks to it through a
//! [`SessionTransport`], which queues [`ServerMessage`]s so writes never interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::error::TransportError;
use crate::protocol::ServerMessage;

/// Default outbound queue depth per session
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Cloneable sending half of a session transport
#[derive(Debug, Clone)]
pub struct SessionTransport {
    tx: mpsc::Sender<ServerMessage>,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    closed: AtomicBool,
    token: CancellationToken,
}

/// Receiving half, drained by the task that owns the socket
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<ServerMessage>,
    shared: Arc<Shared>,
}

impl SessionTransport {
    /// Create a transport and the queue its writer task drains
    pub fn channel(capacity: usize) -> (SessionTransport, OutboundQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            token: CancellationToken::new(),
        });

        (
            SessionTransport {
                tx,
                shared: Arc::clone(&shared),
            },
            OutboundQueue { rx, shared },
        )
    }

    /// Queue a message without waiting
    pub fn send(&self, message: ServerMessage) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Close the transport
    ///
    /// Returns true only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let first = !self.shared.closed.swap(true, Ordering::AcqRel);
        if first {
            self.shared.token.cancel();
        }
        first
    }

    /// Whether the transport has been closed
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Resolves once the transport is closed
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.shared.token.cancelled()
    }
}

impl OutboundQueue {
    /// Next message to write, or None once the transport is closed and drained
    ///
    /// Messages queued before the close are still yielded, so a kick notice
    /// reaches the socket ahead of the close frame. Every send that returned
    /// `Ok` is yielded here before `None`.
    pub async fn next(&mut self) -> Option<ServerMessage> {
        if self.shared.closed.load(Ordering::Acquire) {
            return self.drain().await;
        }

        tokio::select! {
            biased;
            message = self.rx.recv() => message,
            _ = self.shared.token.cancelled() => self.drain().await,
        }
    }

    /// Refuse further sends, then hand out what was already accepted
    async fn drain(&mut self) -> Option<ServerMessage> {
        self.rx.close();
        self.rx.recv().await
    }

    /// Mark the transport closed from the writer side (e.g. the socket failed)
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            self.shared.token.cancel();
        }
    }
}
