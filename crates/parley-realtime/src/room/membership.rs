//! Reverse index: which rooms each connection is in.

use std::collections::HashSet;

use dashmap::DashMap;

use parley_core::types::ConnectionId;

/// Connection → room names.
#[derive(Debug, Default)]
pub struct MembershipIndex {
    conn_to_rooms: DashMap<ConnectionId, HashSet<String>>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, conn_id: ConnectionId, room: &str) {
        self.conn_to_rooms
            .entry(conn_id)
            .or_default()
            .insert(room.to_string());
    }

    pub fn remove(&self, conn_id: ConnectionId, room: &str) {
        if let Some(mut rooms) = self.conn_to_rooms.get_mut(&conn_id) {
            rooms.remove(room);
            if rooms.is_empty() {
                drop(rooms);
                self.conn_to_rooms.remove_if(&conn_id, |_, r| r.is_empty());
            }
        }
    }

    pub fn rooms_of(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.conn_to_rooms
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.conn_to_rooms
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default()
    }
}
