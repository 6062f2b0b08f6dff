//! Presence table: which users are connected, through which connections,
//! and when each absent user was last seen.
//!
//! Only [`ConnectionManager`](crate::connection::manager::ConnectionManager)
//! writes to the table; everything else reads it through
//! [`PresenceLookup`].
//!
//! Entries are never removed. Memory grows with the number of distinct users
//! seen since process start, not with connection churn.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use parley_core::model::OnlineStatus;
use parley_core::traits::PresenceLookup;
use parley_core::types::{ConnectionId, UserId};

/// Per-user presence. `online_since` is `Online` iff `connections` is non-empty.
#[derive(Debug, Clone)]
struct PresenceEntry {
    connections: HashSet<ConnectionId>,
    online_since: OnlineStatus,
}

/// What a register or deregister call did to a user's presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTransition {
    /// First live connection; the user just came online.
    CameOnline,
    /// Connection count changed but the user stays online.
    StillOnline,
    /// Last connection gone; the user is now offline since the given instant.
    WentOffline(DateTime<Utc>),
    /// Nothing was recorded for that connection.
    Unchanged,
}

/// Concurrent map of user presence.
#[derive(Debug, Default)]
pub struct PresenceTable {
    entries: DashMap<UserId, PresenceEntry>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live connection for `user_id`.
    pub(crate) fn register(&self, user_id: UserId, conn_id: ConnectionId) -> PresenceTransition {
        let mut entry = self.entries.entry(user_id).or_insert_with(|| PresenceEntry {
            connections: HashSet::new(),
            online_since: OnlineStatus::Offline,
        });

        let was_online = !entry.connections.is_empty();
        if !entry.connections.insert(conn_id) {
            return PresenceTransition::Unchanged;
        }
        entry.online_since = OnlineStatus::Online;

        if was_online {
            PresenceTransition::StillOnline
        } else {
            PresenceTransition::CameOnline
        }
    }

    /// Drop a live connection for `user_id`.
    pub(crate) fn deregister(&self, user_id: UserId, conn_id: ConnectionId) -> PresenceTransition {
        let Some(mut entry) = self.entries.get_mut(&user_id) else {
            return PresenceTransition::Unchanged;
        };

        if !entry.connections.remove(&conn_id) {
            return PresenceTransition::Unchanged;
        }

        if entry.connections.is_empty() {
            let now = Utc::now();
            entry.online_since = OnlineStatus::LastSeen(now);
            PresenceTransition::WentOffline(now)
        } else {
            PresenceTransition::StillOnline
        }
    }

    /// Presence as stored, ungated.
    pub fn online_since(&self, user_id: UserId) -> OnlineStatus {
        self.entries
            .get(&user_id)
            .map(|e| e.online_since)
            .unwrap_or(OnlineStatus::Offline)
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.online_since(user_id).is_online()
    }

    /// Live connection count for `user_id`.
    pub fn connection_count(&self, user_id: UserId) -> usize {
        self.entries
            .get(&user_id)
            .map(|e| e.connections.len())
            .unwrap_or(0)
    }

    /// Number of users with at least one live connection.
    pub fn online_user_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.connections.is_empty())
            .count()
    }
}

impl PresenceLookup for PresenceTable {
    fn is_online(&self, user_id: UserId) -> bool {
        PresenceTable::is_online(self, user_id)
    }

    fn online_status(&self, user_id: UserId) -> OnlineStatus {
        self.online_since(user_id)
    }
}
