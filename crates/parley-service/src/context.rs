//! Request context carrying the authenticated user and session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_core::model::Identity;
use parley_core::types::{SessionId, UserId};

/// Context for the current authenticated request.
///
/// Built by the API's auth extractor and passed into service methods so
/// that every operation knows *who* is acting and from *which* session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The login session the request came through.
    pub session_id: SessionId,
    /// The username at the time the token was validated.
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(user_id: UserId, session_id: SessionId, username: String) -> Self {
        Self {
            user_id,
            session_id,
            username,
            request_time: Utc::now(),
        }
    }
}

impl From<Identity> for RequestContext {
    fn from(identity: Identity) -> Self {
        Self::new(identity.id, identity.session_id, identity.username)
    }
}
