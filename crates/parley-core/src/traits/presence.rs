//! Read-only view of live presence.

use crate::model::OnlineStatus;
use crate::types::UserId;

/// Read access to presence, handed to anything that is not the owner.
pub trait PresenceLookup: Send + Sync {
    /// Whether the user has at least one live connection.
    fn is_online(&self, user_id: UserId) -> bool;

    /// Raw presence, ungated.
    fn online_status(&self, user_id: UserId) -> OnlineStatus;
}
