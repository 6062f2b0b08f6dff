//! User and relationship models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Relationship state held by one user toward another.
///
/// The store keeps both directions mirrored: `Outgoing` pairs with
/// `Incoming`, `Friend` with `Friend`, `Blocked` with `BlockedByOther`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum RelationStatus {
    None,
    Outgoing,
    Incoming,
    Friend,
    Blocked,
    BlockedByOther,
}

impl RelationStatus {
    /// The state the other side of the pair must hold.
    pub fn mirror(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
            Self::Friend => Self::Friend,
            Self::Blocked => Self::BlockedByOther,
            Self::BlockedByOther => Self::Blocked,
        }
    }
}

/// One entry of a user's relationship list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// The other user.
    pub id: UserId,
    /// State held toward that user.
    pub status: RelationStatus,
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Relationship list toward other users.
    #[serde(default)]
    pub relations: Vec<Relation>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// State this user holds toward `other`, if any row exists.
    pub fn relation_to(&self, other: UserId) -> Option<RelationStatus> {
        self.relations
            .iter()
            .find(|r| r.id == other)
            .map(|r| r.status)
    }

    /// Ids of every user this user is friends with.
    pub fn friend_ids(&self) -> Vec<UserId> {
        self.relations
            .iter()
            .filter(|r| r.status == RelationStatus::Friend)
            .map(|r| r.id)
            .collect()
    }
}
