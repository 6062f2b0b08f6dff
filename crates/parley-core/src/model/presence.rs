//! Presence values as delivered to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::user::RelationStatus;
use crate::types::UserId;

/// Presence of a user as seen by someone else.
///
/// On the wire this is `true` while connected, the RFC 3339 timestamp of the
/// last disconnect once the user has gone away, and `false` when the user
/// has not connected since process start or the viewer may not see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnlineStatus {
    Online,
    LastSeen(DateTime<Utc>),
    #[default]
    Offline,
}

impl OnlineStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// Hide presence unless the viewer is a friend.
    pub fn gated(self, relationship: Option<RelationStatus>) -> Self {
        if relationship == Some(RelationStatus::Friend) {
            self
        } else {
            Self::Offline
        }
    }
}

impl Serialize for OnlineStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Online => serializer.serialize_bool(true),
            Self::Offline => serializer.serialize_bool(false),
            Self::LastSeen(at) => serializer.serialize_str(&at.to_rfc3339()),
        }
    }
}

impl<'de> Deserialize<'de> for OnlineStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Since(DateTime<Utc>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Self::Online,
            Raw::Flag(false) => Self::Offline,
            Raw::Since(at) => Self::LastSeen(at),
        })
    }
}

/// One entry of the snapshot's related-user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedUser {
    pub id: UserId,
    pub username: String,
    pub online: OnlineStatus,
    /// Absent when the user is linked only through a chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationStatus>,
}
