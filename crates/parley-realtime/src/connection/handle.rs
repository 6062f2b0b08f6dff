//! Individual WebSocket connection handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use parley_core::types::{ConnectionId, SessionId, UserId};

use crate::message::types::ServerEvent;

/// Outbound side of one socket: a frame queue plus a close signal.
///
/// Exists before authentication so connect-time failures can still be
/// reported to the client.
#[derive(Debug, Clone)]
pub struct ConnectionSink {
    sender: mpsc::Sender<String>,
    closer: CancellationToken,
}

impl ConnectionSink {
    /// Create a sink and the receiving end the socket task drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                sender,
                closer: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Queue a pre-encoded frame. Returns `false` if it was dropped.
    pub fn send_frame(&self, frame: String) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Connection send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.closer.cancel();
                false
            }
        }
    }

    /// Encode and queue one event.
    pub fn send_event(&self, event: &ServerEvent) -> bool {
        match event.to_frame() {
            Ok(frame) => self.send_frame(frame),
            Err(e) => {
                error!(event = event.name(), error = %e, "Failed to encode outbound event");
                false
            }
        }
    }

    /// Ask the socket task to close the connection.
    pub fn close(&self) {
        self.closer.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.closer.cancelled().await
    }
}

/// A handle to a single authenticated WebSocket connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Login session the connection authenticated with
    pub session_id: SessionId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sink: ConnectionSink,
}

impl ConnectionHandle {
    pub fn new(user_id: UserId, session_id: SessionId, sink: ConnectionSink) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::new(),
            user_id,
            session_id,
            connected_at: Utc::now(),
            sink,
        })
    }

    pub fn send_frame(&self, frame: String) -> bool {
        self.sink.send_frame(frame)
    }

    pub fn send_event(&self, event: &ServerEvent) -> bool {
        self.sink.send_event(event)
    }

    pub fn close(&self) {
        self.sink.close();
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    pub fn sink(&self) -> &ConnectionSink {
        &self.sink
    }
}
