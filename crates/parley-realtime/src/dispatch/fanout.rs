//! Event fan-out: the emission surface the service layer calls after a
//! domain change. Each operation shapes the payload and picks its rooms.

use std::sync::Arc;

use tracing::{debug, info};

use parley_core::model::{Chat, Message, OnlineStatus, RelationStatus};
use parley_core::result::AppResult;
use parley_core::traits::PresenceLookup;
use parley_core::types::{ChatId, SessionId, UserId};

use crate::connection::handle::ConnectionSink;
use crate::message::types::{ChatUpdate, Exception, NewMessage, ServerEvent, UserPatch, UserUpdate};
use crate::room::names::{direct_chat_room, user_room, user_session_room};
use crate::room::router::RoomRouter;

/// Translates domain events into room emissions.
pub struct EventFanout {
    router: Arc<RoomRouter>,
    presence: Arc<dyn PresenceLookup>,
}

impl std::fmt::Debug for EventFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFanout").finish()
    }
}

impl EventFanout {
    pub fn new(router: Arc<RoomRouter>, presence: Arc<dyn PresenceLookup>) -> Self {
        Self { router, presence }
    }

    pub fn router(&self) -> &Arc<RoomRouter> {
        &self.router
    }

    fn user_update(&self, rooms: &[String], user: UserPatch, message: Option<&str>) -> AppResult<usize> {
        let event = ServerEvent::UserUpdate(UserUpdate {
            user,
            message: message.map(str::to_string),
        });
        self.router.emit(rooms, &event)
    }

    /// Tell `friend_ids` that `user_id` came online or went away.
    pub fn emit_presence(
        &self,
        user_id: UserId,
        online: OnlineStatus,
        friend_ids: &[UserId],
    ) -> AppResult<usize> {
        let rooms: Vec<String> = friend_ids.iter().map(|id| user_room(*id)).collect();
        self.user_update(&rooms, UserPatch::new(user_id).online(online), None)
    }

    /// A friend request went from `sender` to `receiver`.
    pub fn emit_friend_request(
        &self,
        sender: (UserId, &str),
        receiver: (UserId, &str),
    ) -> AppResult<()> {
        self.user_update(
            &[user_room(sender.0)],
            UserPatch::new(receiver.0)
                .username(receiver.1)
                .relationship(RelationStatus::Outgoing),
            None,
        )?;
        self.user_update(
            &[user_room(receiver.0)],
            UserPatch::new(sender.0)
                .username(sender.1)
                .relationship(RelationStatus::Incoming),
            None,
        )?;
        debug!(sender = %sender.0, receiver = %receiver.0, "Friend request emitted");
        Ok(())
    }

    /// `user_id` and `receiver_id` became friends sharing `chat`.
    ///
    /// Both sides learn the other's presence, every connection of both joins
    /// the chat room, and the chat itself is pushed into that room.
    pub fn emit_friend_added(&self, user_id: UserId, receiver_id: UserId, chat: &Chat) -> AppResult<()> {
        self.user_update(
            &[user_room(user_id)],
            UserPatch::new(receiver_id)
                .online(self.presence.online_status(receiver_id))
                .relationship(RelationStatus::Friend),
            None,
        )?;
        self.user_update(
            &[user_room(receiver_id)],
            UserPatch::new(user_id)
                .online(self.presence.online_status(user_id))
                .relationship(RelationStatus::Friend),
            None,
        )?;

        self.router.join_direct_chat_room(&[user_id, receiver_id], chat.id);
        self.router.emit_to(
            direct_chat_room(chat.id),
            &ServerEvent::ChatUpdate(ChatUpdate { chat: chat.clone() }),
        )?;
        debug!(user = %user_id, receiver = %receiver_id, chat_id = %chat.id, "Friend added emitted");
        Ok(())
    }

    /// The relation between the two users was deleted.
    ///
    /// Only a severed friendship takes the pair out of their chat room.
    pub fn emit_friend_removed(
        &self,
        user_id: UserId,
        receiver_id: UserId,
        prior: RelationStatus,
        message: &str,
        chat_id: Option<ChatId>,
    ) -> AppResult<()> {
        for (room_owner, subject) in [(user_id, receiver_id), (receiver_id, user_id)] {
            self.user_update(
                &[user_room(room_owner)],
                UserPatch::new(subject)
                    .relationship(RelationStatus::None)
                    .online(OnlineStatus::Offline),
                Some(message),
            )?;
        }

        if prior == RelationStatus::Friend {
            if let Some(chat_id) = chat_id {
                self.router.leave_direct_chat_room(&[user_id, receiver_id], chat_id);
            }
        }
        Ok(())
    }

    /// A message was stored; push it to the chat room with the sender's correlation id.
    pub fn emit_new_message(&self, message: &Message, ack_id: Option<String>) -> AppResult<usize> {
        self.router.emit_to(
            direct_chat_room(message.chat_id),
            &ServerEvent::MessageNew(NewMessage {
                message: message.clone(),
                ack_id,
            }),
        )
    }

    /// Push a chat to the listed users' rooms. User rooms are used because a
    /// brand-new chat has no room yet.
    pub fn emit_chat_update(&self, chat: &Chat, user_ids: &[UserId]) -> AppResult<usize> {
        let rooms: Vec<String> = user_ids.iter().map(|id| user_room(*id)).collect();
        self.router
            .emit(&rooms, &ServerEvent::ChatUpdate(ChatUpdate { chat: chat.clone() }))
    }

    /// Close every connection that authenticated with `session_id`.
    pub fn logout_session(&self, session_id: SessionId) -> AppResult<usize> {
        let closed = self.router.disconnect_room(&user_session_room(session_id))?;
        info!(session_id = %session_id, closed, "Session logged out");
        Ok(closed)
    }

    /// Send an `exception` event straight to one socket.
    pub fn emit_exception(sink: &ConnectionSink, kind: &str, message: &str) -> bool {
        sink.send_event(&ServerEvent::Exception(Exception {
            kind: kind.to_string(),
            message: message.to_string(),
        }))
    }
}
