//! User presence tracking.

pub mod table;

pub use table::{PresenceTable, PresenceTransition};
