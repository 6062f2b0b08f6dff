//! The "Ready" snapshot delivered right after a connection authenticates.

pub mod assembler;

use serde::{Deserialize, Serialize};

use parley_core::model::{Chat, Message, RelatedUser};
use parley_core::types::{SessionId, UserId};

pub use assembler::SnapshotAssembler;

/// Consistent initial state for one connection. Recomputed on every connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: UserId,
    pub username: String,
    pub related_users: Vec<RelatedUser>,
    pub chats: Vec<Chat>,
    pub last_messages: Vec<Message>,
    pub session_id: SessionId,
}
