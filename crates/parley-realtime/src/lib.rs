//! # parley-realtime
//!
//! Real-time presence and fan-out core for Parley. Provides:
//!
//! - Identity resolution for incoming connections (handshake field or
//!   `Authorization: Bearer` header)
//! - A presence table tracking every user's live connections and last-seen time
//! - Connection lifecycle with first-connect / last-disconnect presence broadcasts
//! - The "Ready" snapshot assembled for each new connection
//! - Named rooms (user, login session, direct chat) and emission into them
//! - The event fan-out surface used by the service layer
//! - A client-side ready gate that holds events until the snapshot arrives

pub mod client;
pub mod connection;
pub mod dispatch;
pub mod gateway;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod room;
pub mod server;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::manager::ConnectionManager;
pub use dispatch::fanout::EventFanout;
pub use gateway::Gateway;
pub use presence::table::PresenceTable;
pub use room::router::RoomRouter;
pub use server::RealtimeHub;
pub use snapshot::assembler::SnapshotAssembler;
