//! Request DTOs with validation.

use serde::{Deserialize, Deserializer};
use validator::Validate;

use parley_core::types::MessageId;

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

/// `POST /api/auth/register` and `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Username must not be empty."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty."))]
    pub password: String,
}

/// `POST /api/chats/{id}/messages`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Counted in characters after trimming.
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 1024,
        message = "Message content must be between 1 and 1024 characters."
    ))]
    pub content: String,
    /// Client correlation id, echoed on `Message:New` and in the response.
    #[serde(default, alias = "ackId")]
    pub ack_id: Option<String>,
}

/// `GET /api/chats/{id}/messages?before=&after=&limit=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub before: Option<MessageId>,
    pub after: Option<MessageId>,
    pub limit: Option<usize>,
}

/// How `PUT /api/users/{usernameOrId}/friend` reads its path segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendLookup {
    #[default]
    Username,
    Id,
}

/// `?type=` on the friend routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendQuery {
    #[serde(rename = "type", default)]
    pub lookup: FriendLookup,
}

/// `GET /ws?token=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQuery {
    /// Token handed over in the handshake itself; wins over the header.
    pub token: Option<String>,
}
