//! Events pushed to clients over the persistent connection.
//!
//! Every event travels as one JSON text frame `{"event": <name>, "data": <payload>}`.
//! Event names are part of the client contract and must not change.

use serde::{Deserialize, Serialize};

use parley_core::model::{Chat, Message, OnlineStatus, RelationStatus};
use parley_core::result::AppResult;
use parley_core::types::UserId;

use crate::snapshot::Snapshot;

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Initial snapshot, sent once per successful connection.
    #[serde(rename = "Ready")]
    Ready(Snapshot),
    /// A related user's presence, relationship or profile changed.
    #[serde(rename = "User:Update")]
    UserUpdate(UserUpdate),
    /// A chat was created or changed.
    #[serde(rename = "Chat:Update")]
    ChatUpdate(ChatUpdate),
    /// A message was stored in a chat the receiver is part of.
    #[serde(rename = "Message:New")]
    MessageNew(NewMessage),
    /// A failure the client should know about.
    #[serde(rename = "exception")]
    Exception(Exception),
}

impl ServerEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "Ready",
            Self::UserUpdate(_) => "User:Update",
            Self::ChatUpdate(_) => "Chat:Update",
            Self::MessageNew(_) => "Message:New",
            Self::Exception(_) => "exception",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Encode as a text frame.
    pub fn to_frame(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a text frame.
    pub fn from_frame(frame: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// Partial view of a user; only the fields that changed are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<OnlineStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UserPatch {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            online: None,
            relationship: None,
            username: None,
        }
    }

    pub fn online(mut self, online: OnlineStatus) -> Self {
        self.online = Some(online);
        self
    }

    pub fn relationship(mut self, relationship: RelationStatus) -> Self {
        self.relationship = Some(relationship);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Payload of `User:Update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub user: UserPatch,
    /// Human-readable note shown alongside the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of `Chat:Update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub chat: Chat,
}

/// Payload of `Message:New`: the message fields plus the sender's correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    #[serde(flatten)]
    pub message: Message,
    #[serde(rename = "ackId", default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<String>,
}

/// Payload of `exception`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}
