//! Authenticated identity returned by the auth collaborator.

use serde::{Deserialize, Serialize};

use super::user::{Relation, RelationStatus};
use crate::types::{SessionId, UserId};

/// Who is behind a token, and through which session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub session_id: SessionId,
    /// Present only when the full profile was requested.
    pub relations: Option<Vec<Relation>>,
}

impl Identity {
    /// The relationship list, empty for the no-profile variant.
    pub fn relations(&self) -> &[Relation] {
        self.relations.as_deref().unwrap_or(&[])
    }

    pub fn relation_to(&self, other: UserId) -> Option<RelationStatus> {
        self.relations()
            .iter()
            .find(|r| r.id == other)
            .map(|r| r.status)
    }
}
