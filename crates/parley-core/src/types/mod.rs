//! Shared value types.

pub mod id;

pub use id::{ChatId, ConnectionId, MessageId, SessionId, UserId};
