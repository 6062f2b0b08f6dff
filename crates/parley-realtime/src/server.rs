//! Top-level real-time hub that ties the subsystems together.
//!
//! Wiring is two-phase. [`RealtimeHub::new`] builds everything that has no
//! outside collaborators (pool, rooms, presence, fan-out) so the service
//! layer can be handed the fan-out. [`RealtimeHub::gateway`] then closes the
//! loop once the services that implement the directory traits exist.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use parley_core::config::realtime::RealtimeConfig;
use parley_core::result::AppResult;
use parley_core::traits::{ChatDirectory, PresenceLookup, TokenValidator, UserDirectory};

use crate::connection::authenticator::IdentityResolver;
use crate::connection::manager::ConnectionManager;
use crate::connection::pool::ConnectionPool;
use crate::dispatch::fanout::EventFanout;
use crate::gateway::Gateway;
use crate::metrics::RealtimeMetrics;
use crate::presence::table::PresenceTable;
use crate::room::registry::RoomRegistry;
use crate::room::router::RoomRouter;
use crate::snapshot::assembler::SnapshotAssembler;

/// Central real-time hub.
#[derive(Clone)]
pub struct RealtimeHub {
    /// Every authenticated connection.
    pub pool: Arc<ConnectionPool>,
    /// Room membership and emission.
    pub router: Arc<RoomRouter>,
    /// Live presence. Written only by the connection manager.
    pub presence: Arc<PresenceTable>,
    /// Emission surface for the service layer.
    pub fanout: Arc<EventFanout>,
    /// Counters.
    pub metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("connections", &self.pool.connection_count())
            .finish()
    }
}

impl RealtimeHub {
    /// First wiring phase.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RealtimeMetrics::new());
        let pool = Arc::new(ConnectionPool::new());
        let rooms = Arc::new(RoomRegistry::new());
        let router = Arc::new(RoomRouter::new(pool.clone(), rooms, metrics.clone()));
        let presence = Arc::new(PresenceTable::new());
        let lookup: Arc<dyn PresenceLookup> = presence.clone();
        let fanout = Arc::new(EventFanout::new(router.clone(), lookup));

        info!("Real-time hub initialized");

        Self {
            pool,
            router,
            presence,
            fanout,
            metrics,
            config,
            shutdown_tx,
        }
    }

    /// Second wiring phase: bind the collaborators and build the gateway.
    pub fn gateway(
        &self,
        tokens: Arc<dyn TokenValidator>,
        users: Arc<dyn UserDirectory>,
        chats: Arc<dyn ChatDirectory>,
    ) -> Gateway {
        let connections = Arc::new(ConnectionManager::new(
            self.pool.clone(),
            self.router.clone(),
            self.presence.clone(),
            self.fanout.clone(),
            users.clone(),
            self.metrics.clone(),
            self.config.clone(),
        ));

        Gateway::new(
            IdentityResolver::new(tokens),
            SnapshotAssembler::new(users, chats),
            connections,
            self.router.clone(),
            self.metrics.clone(),
            Duration::from_secs(self.config.handshake_timeout_seconds),
        )
    }

    /// Buffer size for each connection's outbound queue.
    pub fn channel_buffer_size(&self) -> usize {
        self.config.channel_buffer_size
    }

    /// Returns a shutdown receiver for socket tasks.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal socket tasks to stop and close every connection.
    pub fn shutdown(&self) -> AppResult<()> {
        info!("Shutting down real-time hub");
        let _ = self.shutdown_tx.send(());

        let all = self.pool.all_connections();
        for conn in &all {
            conn.close();
        }

        info!(closed = all.len(), "Real-time hub shut down");
        Ok(())
    }
}
