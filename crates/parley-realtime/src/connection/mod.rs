//! WebSocket connection management: identity resolution, handles, pool, lifecycle.

pub mod authenticator;
pub mod handle;
pub mod manager;
pub mod pool;

pub use authenticator::{Handshake, IdentityResolver};
pub use handle::{ConnectionHandle, ConnectionSink};
pub use manager::ConnectionManager;
pub use pool::ConnectionPool;
