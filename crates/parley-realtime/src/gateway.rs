//! Connection gateway: the connect and disconnect lifecycle of one socket.
//!
//! Connect resolves the identity, assembles the snapshot, joins rooms,
//! sends `Ready` and records presence. Any failure is reported to the
//! client as an `exception` event followed by a close; internal detail
//! stays in the logs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use parley_core::error::{AppError, ErrorKind, GENERIC_CLIENT_MESSAGE};
use parley_core::model::Identity;
use parley_core::result::AppResult;

use crate::connection::authenticator::{Handshake, IdentityResolver};
use crate::connection::handle::{ConnectionHandle, ConnectionSink};
use crate::connection::manager::ConnectionManager;
use crate::dispatch::fanout::EventFanout;
use crate::message::types::ServerEvent;
use crate::metrics::RealtimeMetrics;
use crate::room::names::{direct_chat_room, user_room, user_session_room};
use crate::room::router::RoomRouter;
use crate::snapshot::Snapshot;
use crate::snapshot::assembler::{SnapshotAssembler, friend_chats};

/// `type` of the exception sent when a connection is refused.
pub const CONNECT_EXCEPTION: &str = "onGatewayConnection";
/// Client-facing message for any authentication or session failure.
pub const INVALID_SESSION: &str = "Invalid session.";

/// Entry point for socket lifecycle events.
#[derive(Clone)]
pub struct Gateway {
    resolver: IdentityResolver,
    assembler: SnapshotAssembler,
    connections: Arc<ConnectionManager>,
    router: Arc<RoomRouter>,
    metrics: Arc<RealtimeMetrics>,
    handshake_timeout: Duration,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl Gateway {
    pub fn new(
        resolver: IdentityResolver,
        assembler: SnapshotAssembler,
        connections: Arc<ConnectionManager>,
        router: Arc<RoomRouter>,
        metrics: Arc<RealtimeMetrics>,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            assembler,
            connections,
            router,
            metrics,
            handshake_timeout,
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Bring a new socket online.
    ///
    /// On failure the client has already been sent the exception and the
    /// sink has been closed; the error is returned for the caller's logs.
    pub async fn connect(&self, handshake: &Handshake, sink: ConnectionSink) -> AppResult<Arc<ConnectionHandle>> {
        let started = Instant::now();

        let authenticated = match tokio::time::timeout(self.handshake_timeout, self.authenticate(handshake)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::internal(format!(
                "Handshake did not complete within {:?}",
                self.handshake_timeout
            ))),
        };

        let (identity, snapshot) = match authenticated {
            Ok(pair) => pair,
            Err(e) => {
                self.reject(&sink, &e);
                return Err(e);
            }
        };

        let handle = ConnectionHandle::new(identity.id, identity.session_id, sink);
        if let Err(e) = self.establish(&identity, snapshot, &handle) {
            self.reject(handle.sink(), &e);
            self.teardown(&handle).await;
            return Err(e);
        }

        info!(
            conn_id = %handle.id,
            user_id = %identity.id,
            session_id = %identity.session_id,
            duration_ms = started.elapsed().as_millis() as u64,
            "ws_connect_success"
        );
        Ok(handle)
    }

    async fn authenticate(&self, handshake: &Handshake) -> AppResult<(Identity, Snapshot)> {
        let identity = self.resolver.resolve(handshake).await?;
        let snapshot = self
            .assembler
            .build_snapshot(&identity, self.connections.presence().as_ref())
            .await?;
        Ok((identity, snapshot))
    }

    fn establish(&self, identity: &Identity, snapshot: Snapshot, handle: &Arc<ConnectionHandle>) -> AppResult<()> {
        self.connections.attach(handle.clone())?;

        let mut rooms = vec![user_room(identity.id), user_session_room(identity.session_id)];
        rooms.extend(friend_chats(identity, &snapshot.chats).map(|c| direct_chat_room(c.id)));
        self.router.join(handle.id, &rooms);

        if !handle.send_event(&ServerEvent::Ready(snapshot)) {
            return Err(AppError::internal("Could not deliver Ready snapshot"));
        }

        self.connections.register_connection(identity, handle.id)
    }

    fn reject(&self, sink: &ConnectionSink, err: &AppError) {
        let message = match err.kind {
            ErrorKind::Authentication | ErrorKind::NotFound => {
                warn!(kind = %err.kind, reason = %err.message, "ws_connect_fail,invalid_session");
                INVALID_SESSION
            }
            _ => {
                error!(kind = %err.kind, error = %err, "ws_connect_fail,unknown_error");
                GENERIC_CLIENT_MESSAGE
            }
        };

        EventFanout::emit_exception(sink, CONNECT_EXCEPTION, message);
        sink.close();
        self.metrics.connection_rejected();
    }

    async fn teardown(&self, handle: &ConnectionHandle) {
        self.connections.detach(handle.id);
        if let Err(e) = self
            .connections
            .deregister_connection(handle.user_id, handle.id)
            .await
        {
            debug!(conn_id = %handle.id, error = %e, "Teardown after failed connect");
        }
    }

    /// Take a socket offline. Never fails.
    ///
    /// Domain errors here are expected races (a user or session already
    /// gone) and are dropped; anything else is logged.
    pub async fn disconnect(&self, handle: &ConnectionHandle) {
        let started = Instant::now();
        self.connections.detach(handle.id);

        match self
            .connections
            .deregister_connection(handle.user_id, handle.id)
            .await
        {
            Ok(()) => info!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                duration_ms = started.elapsed().as_millis() as u64,
                "ws_disconnect_success"
            ),
            Err(e) if e.is_domain() => {
                debug!(conn_id = %handle.id, error = %e, "Disconnect raced a domain change");
            }
            Err(e) => {
                error!(conn_id = %handle.id, user_id = %handle.user_id, error = %e, "ws_disconnect_error,unknown_error");
            }
        }
    }
}
