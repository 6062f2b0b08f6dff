//! Room name derivation. Pure and total.

use parley_core::types::{ChatId, SessionId, UserId};

/// Prefix of the room every connection of a user joins.
pub const USER_ROOM_PREFIX: &str = "user";
/// Prefix of the room shared by connections of one login session.
pub const USER_SESSION_ROOM_PREFIX: &str = "user-sessid";
/// Prefix of a direct chat's room.
pub const DIRECT_CHAT_ROOM_PREFIX: &str = "chat-direct";

pub fn user_room(user_id: UserId) -> String {
    format!("{USER_ROOM_PREFIX}:{user_id}")
}

pub fn user_session_room(session_id: SessionId) -> String {
    format!("{USER_SESSION_ROOM_PREFIX}:{session_id}")
}

pub fn direct_chat_room(chat_id: ChatId) -> String {
    format!("{DIRECT_CHAT_ROOM_PREFIX}:{chat_id}")
}
