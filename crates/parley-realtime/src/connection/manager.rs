//! Connection manager: owns the write side of the presence table and turns
//! connection churn into presence broadcasts.

use std::sync::Arc;

use tracing::{debug, info, warn};

use parley_core::config::realtime::RealtimeConfig;
use parley_core::error::AppError;
use parley_core::model::{Identity, OnlineStatus, RelationStatus};
use parley_core::result::AppResult;
use parley_core::traits::UserDirectory;
use parley_core::types::{ConnectionId, UserId};

use crate::dispatch::fanout::EventFanout;
use crate::metrics::RealtimeMetrics;
use crate::presence::table::{PresenceTable, PresenceTransition};
use crate::room::router::RoomRouter;

use super::handle::ConnectionHandle;
use super::pool::ConnectionPool;

/// Manages all authenticated WebSocket connections.
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    router: Arc<RoomRouter>,
    presence: Arc<PresenceTable>,
    fanout: Arc<EventFanout>,
    users: Arc<dyn UserDirectory>,
    metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.pool.connection_count())
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(
        pool: Arc<ConnectionPool>,
        router: Arc<RoomRouter>,
        presence: Arc<PresenceTable>,
        fanout: Arc<EventFanout>,
        users: Arc<dyn UserDirectory>,
        metrics: Arc<RealtimeMetrics>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            pool,
            router,
            presence,
            fanout,
            users,
            metrics,
            config,
        }
    }

    /// Put an authenticated connection into the pool.
    pub fn attach(&self, handle: Arc<ConnectionHandle>) -> AppResult<()> {
        let max = self.config.max_connections_per_user;
        if max > 0 && self.pool.user_connections(handle.user_id).len() >= max {
            warn!(user_id = %handle.user_id, max, "User at max connections");
            return Err(AppError::conflict("Too many open connections."));
        }

        self.pool.add(handle.clone());
        self.metrics.connection_accepted();
        debug!(conn_id = %handle.id, user_id = %handle.user_id, "Connection attached");
        Ok(())
    }

    /// Take a connection out of the pool and every room.
    pub fn detach(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let handle = self.pool.remove(conn_id)?;
        self.router.leave_all(conn_id);
        handle.close();
        self.metrics.connection_closed();
        debug!(conn_id = %conn_id, user_id = %handle.user_id, "Connection detached");
        Some(handle)
    }

    /// Record a live connection for `identity`.
    ///
    /// Only the user's first connection is announced, to the friends listed
    /// in the identity's relationship list.
    pub fn register_connection(&self, identity: &Identity, conn_id: ConnectionId) -> AppResult<()> {
        let transition = self.presence.register(identity.id, conn_id);

        if transition == PresenceTransition::CameOnline {
            let friend_ids: Vec<UserId> = identity
                .relations()
                .iter()
                .filter(|r| r.status == RelationStatus::Friend)
                .map(|r| r.id)
                .collect();

            if !friend_ids.is_empty() {
                self.fanout
                    .emit_presence(identity.id, OnlineStatus::Online, &friend_ids)?;
            }
            info!(user_id = %identity.id, friends = friend_ids.len(), "User online");
        }

        debug!(conn_id = %conn_id, user_id = %identity.id, ?transition, "Connection registered");
        Ok(())
    }

    /// Forget a live connection.
    ///
    /// When it was the user's last one, the disconnect time becomes the
    /// last-seen marker and the user's current friends are told, unless the
    /// user came back while the friend list was being fetched.
    pub async fn deregister_connection(&self, user_id: UserId, conn_id: ConnectionId) -> AppResult<()> {
        let transition = self.presence.deregister(user_id, conn_id);
        debug!(conn_id = %conn_id, user_id = %user_id, ?transition, "Connection deregistered");

        let PresenceTransition::WentOffline(at) = transition else {
            return Ok(());
        };

        let friend_ids = self.users.get_friend_ids(user_id).await?;

        // A reconnect during the lookup owns presence now.
        if self.presence.online_since(user_id) != OnlineStatus::LastSeen(at) {
            debug!(user_id = %user_id, "Reconnected before offline broadcast; skipped");
            return Ok(());
        }

        if !friend_ids.is_empty() {
            self.fanout
                .emit_presence(user_id, OnlineStatus::LastSeen(at), &friend_ids)?;
        }
        info!(user_id = %user_id, friends = friend_ids.len(), "User offline");
        Ok(())
    }

    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Read access to presence.
    pub fn presence(&self) -> &Arc<PresenceTable> {
        &self.presence
    }
}
