//! Chat reads and direct message delivery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use parley_core::error::AppError;
use parley_core::model::{Chat, Message, RelationStatus};
use parley_core::result::AppResult;
use parley_core::traits::ChatDirectory;
use parley_core::types::{ChatId, MessageId, UserId};
use parley_database::repositories::message::MessageCursor;
use parley_database::repositories::{ChatRepository, MessageRepository, UserRepository};
use parley_database::{Database, commit};
use parley_realtime::EventFanout;

use crate::context::RequestContext;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

const SEND_FORBIDDEN: &str = "You don't have permission to send messages in this chat.";
const READ_FORBIDDEN: &str = "You don't have permission to read messages of this chat.";

/// Which slice of a chat's history to return.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryQuery {
    /// Only messages older than this one. Wins over `after`.
    pub before: Option<MessageId>,
    /// Only messages newer than this one.
    pub after: Option<MessageId>,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    fn cursor(&self) -> Option<MessageCursor> {
        match (self.before, self.after) {
            (Some(id), _) => Some(MessageCursor::Before(id)),
            (None, Some(id)) => Some(MessageCursor::After(id)),
            (None, None) => None,
        }
    }
}

/// Handles chat listing and direct messages.
#[derive(Debug, Clone)]
pub struct ChatService {
    db: Database,
    chat_repo: Arc<ChatRepository>,
    message_repo: Arc<MessageRepository>,
    user_repo: Arc<UserRepository>,
    fanout: Arc<EventFanout>,
}

impl ChatService {
    pub fn new(
        db: Database,
        chat_repo: Arc<ChatRepository>,
        message_repo: Arc<MessageRepository>,
        user_repo: Arc<UserRepository>,
        fanout: Arc<EventFanout>,
    ) -> Self {
        Self {
            db,
            chat_repo,
            message_repo,
            user_repo,
            fanout,
        }
    }

    /// Store a message in a direct chat with a friend and push it to the chat room.
    ///
    /// Content bounds are checked by the caller; surrounding whitespace is
    /// dropped here. `ack_id` is opaque to the server and comes back
    /// unchanged on `Message:New`.
    pub async fn send_direct_message(
        &self,
        ctx: &RequestContext,
        chat_id: ChatId,
        content: &str,
        ack_id: Option<String>,
    ) -> AppResult<Message> {
        let author_id = ctx.user_id;
        let mut tx = self.db.begin().await?;

        let chat = self
            .chat_repo
            .find_by_id_in_tx(&mut tx, chat_id)
            .await?
            .ok_or_else(|| AppError::not_found("Chat not found."))?;
        if !chat.is_direct() || !chat.has_recipient(author_id) {
            return Err(AppError::forbidden(SEND_FORBIDDEN));
        }

        let relation = match chat.other_recipients(author_id).next() {
            Some(other) => self.user_repo.relation_in_tx(&mut tx, author_id, other).await?,
            None => None,
        };
        if relation != Some(RelationStatus::Friend) {
            return Err(AppError::forbidden("You must be friends to exchange messages."));
        }

        let message = Message {
            id: MessageId::new(),
            chat_id,
            author_id,
            content: content.trim().to_string(),
            created_at: Utc::now(),
        };
        self.message_repo.create_in_tx(&mut tx, &message).await?;
        self.chat_repo.set_last_message_in_tx(&mut tx, chat_id, message.id).await?;
        commit(tx).await?;

        info!(message_id = %message.id, chat_id = %chat_id, author_id = %author_id, "Direct message stored");
        if let Err(e) = self.fanout.emit_new_message(&message, ack_id) {
            error!(event = "message_new", error = %e, "Emission after commit failed");
        }
        Ok(message)
    }

    /// A page of a chat's history, newest first.
    pub async fn get_messages(
        &self,
        ctx: &RequestContext,
        chat_id: ChatId,
        query: HistoryQuery,
    ) -> AppResult<Vec<Message>> {
        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| AppError::not_found("Chat not found."))?;
        if !chat.has_recipient(ctx.user_id) {
            return Err(AppError::forbidden(READ_FORBIDDEN));
        }

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.message_repo.find_page(chat_id, query.cursor(), limit).await
    }
}

#[async_trait]
impl ChatDirectory for ChatService {
    async fn get_chats_of_user(&self, user_id: UserId) -> AppResult<Vec<Chat>> {
        self.chat_repo.find_by_user(user_id).await
    }

    async fn get_messages_by_id(&self, ids: &[MessageId]) -> AppResult<Vec<Message>> {
        self.message_repo.find_by_ids(ids).await
    }
}
