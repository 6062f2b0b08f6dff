//! Message repository implementation.

use sqlx::{QueryBuilder, Sqlite};

use parley_core::model::Message;
use parley_core::result::AppResult;
use parley_core::types::{ChatId, MessageId};

use crate::connection::{Database, Tx, db_error};

const MESSAGE_COLUMNS: &str = "id, chat_id, author_id, content, created_at";

/// Where a history page starts. Ids are time ordered, so comparing ids
/// compares send times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCursor {
    /// Only messages older than this one.
    Before(MessageId),
    /// Only messages newer than this one.
    After(MessageId),
}

/// Repository for message reads and inserts.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    db: Database,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetch every message in `ids` that exists.
    pub async fn find_by_ids(&self, ids: &[MessageId]) -> AppResult<Vec<Message>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        query
            .build_query_as()
            .fetch_all(self.db.pool())
            .await
            .map_err(db_error("Failed to find messages"))
    }

    /// One page of a chat's history, newest first.
    ///
    /// The cursor only filters; the page is always the newest `limit`
    /// messages that pass it.
    pub async fn find_page(
        &self,
        chat_id: ChatId,
        cursor: Option<MessageCursor>,
        limit: usize,
    ) -> AppResult<Vec<Message>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = "));
        query.push_bind(chat_id);
        match cursor {
            Some(MessageCursor::Before(id)) => {
                query.push(" AND id < ").push_bind(id);
            }
            Some(MessageCursor::After(id)) => {
                query.push(" AND id > ").push_bind(id);
            }
            None => {}
        }
        query
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        query
            .build_query_as()
            .fetch_all(self.db.pool())
            .await
            .map_err(db_error("Failed to load message history"))
    }

    /// Insert a message inside `tx`.
    pub async fn create_in_tx(&self, tx: &mut Tx<'_>, message: &Message) -> AppResult<()> {
        sqlx::query("INSERT INTO messages (id, chat_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(message.id)
            .bind(message.chat_id)
            .bind(message.author_id)
            .bind(&message.content)
            .bind(message.created_at)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to store message"))?;
        Ok(())
    }
}
