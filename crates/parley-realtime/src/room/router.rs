//! Room router: join, leave and emit against named rooms.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::types::{ChatId, ConnectionId, UserId};

use crate::connection::pool::ConnectionPool;
use crate::message::types::ServerEvent;
use crate::metrics::RealtimeMetrics;

use super::names::{direct_chat_room, user_room};
use super::registry::RoomRegistry;

/// Maps rooms to live connections and delivers events into them.
#[derive(Debug)]
pub struct RoomRouter {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    metrics: Arc<RealtimeMetrics>,
}

impl RoomRouter {
    pub fn new(
        pool: Arc<ConnectionPool>,
        rooms: Arc<RoomRegistry>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            pool,
            rooms,
            metrics,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// Put one connection into each of `rooms`.
    pub fn join(&self, conn_id: ConnectionId, rooms: &[String]) {
        for room in rooms {
            self.rooms.join(room, conn_id);
        }
    }

    /// Take a connection out of every room.
    pub fn leave_all(&self, conn_id: ConnectionId) {
        self.rooms.leave_all(conn_id);
    }

    /// Every connection currently in any of the listed users' rooms joins the chat room.
    pub fn join_direct_chat_room(&self, user_ids: &[UserId], chat_id: ChatId) {
        let chat_room = direct_chat_room(chat_id);
        let mut joined = 0usize;
        for conn_id in self.members_of_users(user_ids) {
            if self.rooms.join(&chat_room, conn_id) {
                joined += 1;
            }
        }
        debug!(room = %chat_room, joined, "Joined direct chat room");
    }

    /// Inverse of [`join_direct_chat_room`](Self::join_direct_chat_room).
    pub fn leave_direct_chat_room(&self, user_ids: &[UserId], chat_id: ChatId) {
        let chat_room = direct_chat_room(chat_id);
        let mut left = 0usize;
        for conn_id in self.members_of_users(user_ids) {
            if self.rooms.leave(&chat_room, conn_id) {
                left += 1;
            }
        }
        debug!(room = %chat_room, left, "Left direct chat room");
    }

    fn members_of_users(&self, user_ids: &[UserId]) -> HashSet<ConnectionId> {
        user_ids
            .iter()
            .flat_map(|id| self.rooms.members(&user_room(*id)))
            .collect()
    }

    /// Deliver `event` to every connection in any of `rooms`, once per connection.
    ///
    /// An empty target list, or a blank room name, is a caller bug and fails
    /// with an internal error instead of sending to nobody.
    pub fn emit(&self, rooms: &[String], event: &ServerEvent) -> AppResult<usize> {
        if rooms.is_empty() || rooms.iter().any(|r| r.trim().is_empty()) {
            error!(
                event = "ws_invalid_room",
                payload = event.name(),
                "Emit called with an empty room list or room name"
            );
            return Err(AppError::internal("Emit target is empty"));
        }

        let frame = event.to_frame()?;
        let targets: HashSet<ConnectionId> =
            rooms.iter().flat_map(|r| self.rooms.members(r)).collect();

        let mut sent = 0usize;
        for conn_id in targets {
            if let Some(handle) = self.pool.get(conn_id) {
                if handle.send_frame(frame.clone()) {
                    sent += 1;
                }
            }
        }

        self.metrics.events_emitted(sent as u64);
        debug!(payload = event.name(), rooms = rooms.len(), sent, "Event emitted");
        Ok(sent)
    }

    /// Shorthand for a single room.
    pub fn emit_to(&self, room: String, event: &ServerEvent) -> AppResult<usize> {
        self.emit(&[room], event)
    }

    /// Close every connection in `room`.
    pub fn disconnect_room(&self, room: &str) -> AppResult<usize> {
        if room.trim().is_empty() {
            error!(event = "ws_invalid_room", "Disconnect called with an empty room name");
            return Err(AppError::internal("Disconnect target is empty"));
        }

        let mut closed = 0usize;
        for conn_id in self.rooms.members(room) {
            if let Some(handle) = self.pool.get(conn_id) {
                handle.close();
                closed += 1;
            }
        }
        info!(room = %room, closed, "Room disconnected");
        Ok(closed)
    }
}
