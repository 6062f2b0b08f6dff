//! Server-to-client event types and their wire framing.

pub mod types;

pub use types::{ChatUpdate, Exception, NewMessage, ServerEvent, UserPatch, UserUpdate};
