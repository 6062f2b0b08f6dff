//! Room registry: room membership in both directions.

use std::collections::HashSet;

use dashmap::DashMap;

use parley_core::types::ConnectionId;

use super::membership::MembershipIndex;

/// Registry of all non-empty rooms.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name → member connections.
    rooms: DashMap<String, HashSet<ConnectionId>>,
    /// Reverse index.
    memberships: MembershipIndex,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room. Returns `false` if it was already a member.
    pub fn join(&self, room: &str, conn_id: ConnectionId) -> bool {
        let inserted = self
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id);
        if inserted {
            self.memberships.add(conn_id, room);
        }
        inserted
    }

    /// Removes a connection from a room. Returns `false` if it was not a member.
    pub fn leave(&self, room: &str, conn_id: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => {
                let removed = members.remove(&conn_id);
                if members.is_empty() {
                    drop(members);
                    self.rooms.remove_if(room, |_, m| m.is_empty());
                }
                removed
            }
            None => false,
        };
        self.memberships.remove(conn_id, room);
        removed
    }

    /// Removes a connection from every room it is in.
    pub fn leave_all(&self, conn_id: ConnectionId) {
        for room in self.memberships.remove_all(conn_id) {
            if let Some(mut members) = self.rooms.get_mut(&room) {
                members.remove(&conn_id);
                if members.is_empty() {
                    drop(members);
                    self.rooms.remove_if(&room, |_, m| m.is_empty());
                }
            }
        }
    }

    /// Member connections of a room.
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Rooms a connection is in.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.memberships.rooms_of(conn_id)
    }

    pub fn is_member(&self, room: &str, conn_id: ConnectionId) -> bool {
        self.rooms
            .get(room)
            .map(|m| m.contains(&conn_id))
            .unwrap_or(false)
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
