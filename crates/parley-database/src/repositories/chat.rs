//! Chat repository implementation.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use parley_core::model::{Chat, ChatRecipient, ChatType};
use parley_core::result::AppResult;
use parley_core::types::{ChatId, MessageId, UserId};

use crate::connection::{Database, Tx, commit, db_error};

#[derive(sqlx::FromRow)]
struct ChatRow {
    id: ChatId,
    name: Option<String>,
    chat_type: ChatType,
    last_message_id: Option<MessageId>,
}

#[derive(sqlx::FromRow)]
struct RecipientRow {
    chat_id: ChatId,
    user_id: UserId,
    nickname: Option<String>,
}

const SELECT_BY_ID: &str = "SELECT id, name, chat_type, last_message_id FROM chats WHERE id = ?";

const SELECT_DIRECT_BETWEEN: &str = "\
    SELECT c.id, c.name, c.chat_type, c.last_message_id FROM chats c \
    WHERE c.chat_type = ? \
      AND EXISTS (SELECT 1 FROM chat_recipients r WHERE r.chat_id = c.id AND r.user_id = ?) \
      AND EXISTS (SELECT 1 FROM chat_recipients r WHERE r.chat_id = c.id AND r.user_id = ?) \
    ORDER BY c.id LIMIT 1";

/// Repository for chats and their participants.
#[derive(Debug, Clone)]
pub struct ChatRepository {
    db: Database,
}

impl ChatRepository {
    /// Create a new chat repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find a chat by ID.
    pub async fn find_by_id(&self, id: ChatId) -> AppResult<Option<Chat>> {
        let mut conn = self.db.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        load_by_id(&mut conn, id).await
    }

    /// Every chat `user_id` participates in.
    pub async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Chat>> {
        let mut conn = self.db.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT c.id, c.name, c.chat_type, c.last_message_id FROM chats c \
             JOIN chat_recipients r ON r.chat_id = c.id \
             WHERE r.user_id = ? ORDER BY c.id",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to find chats of user"))?;
        with_recipients(&mut conn, rows).await
    }

    /// The direct chat between two users, if one exists.
    pub async fn find_direct_between(&self, a: UserId, b: UserId) -> AppResult<Option<Chat>> {
        let mut conn = self.db.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        load_direct_between(&mut conn, a, b).await
    }

    /// Insert a chat with its participants in one transaction.
    pub async fn create(&self, chat: &Chat) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        self.create_in_tx(&mut tx, chat).await?;
        commit(tx).await
    }

    /// Find a chat by ID inside `tx`.
    pub async fn find_by_id_in_tx(&self, tx: &mut Tx<'_>, id: ChatId) -> AppResult<Option<Chat>> {
        load_by_id(tx, id).await
    }

    /// The direct chat between two users inside `tx`.
    pub async fn find_direct_between_in_tx(
        &self,
        tx: &mut Tx<'_>,
        a: UserId,
        b: UserId,
    ) -> AppResult<Option<Chat>> {
        load_direct_between(tx, a, b).await
    }

    /// Insert a chat row and one row per participant.
    pub async fn create_in_tx(&self, tx: &mut Tx<'_>, chat: &Chat) -> AppResult<()> {
        sqlx::query("INSERT INTO chats (id, name, chat_type, last_message_id) VALUES (?, ?, ?, ?)")
            .bind(chat.id)
            .bind(&chat.name)
            .bind(chat.chat_type)
            .bind(chat.last_message_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to create chat"))?;

        for recipient in &chat.recipients {
            sqlx::query("INSERT INTO chat_recipients (chat_id, user_id, nickname) VALUES (?, ?, ?)")
                .bind(chat.id)
                .bind(recipient.id)
                .bind(&recipient.nickname)
                .execute(&mut **tx)
                .await
                .map_err(db_error("Failed to add chat recipient"))?;
        }
        Ok(())
    }

    /// Point a chat at its newest message.
    pub async fn set_last_message_in_tx(
        &self,
        tx: &mut Tx<'_>,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> AppResult<()> {
        sqlx::query("UPDATE chats SET last_message_id = ? WHERE id = ?")
            .bind(message_id)
            .bind(chat_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to update last message"))?;
        Ok(())
    }
}

async fn load_by_id(conn: &mut SqliteConnection, id: ChatId) -> AppResult<Option<Chat>> {
    let row: Option<ChatRow> = sqlx::query_as(SELECT_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to find chat"))?;
    Ok(with_recipients(conn, row.into_iter().collect()).await?.into_iter().next())
}

async fn load_direct_between(conn: &mut SqliteConnection, a: UserId, b: UserId) -> AppResult<Option<Chat>> {
    let row: Option<ChatRow> = sqlx::query_as(SELECT_DIRECT_BETWEEN)
        .bind(ChatType::Direct)
        .bind(a)
        .bind(b)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to find direct chat"))?;
    Ok(with_recipients(conn, row.into_iter().collect()).await?.into_iter().next())
}

/// Attach participants to chat rows, keeping row order.
async fn with_recipients(conn: &mut SqliteConnection, rows: Vec<ChatRow>) -> AppResult<Vec<Chat>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut query =
        QueryBuilder::<Sqlite>::new("SELECT chat_id, user_id, nickname FROM chat_recipients WHERE chat_id IN (");
    let mut separated = query.separated(", ");
    for row in &rows {
        separated.push_bind(row.id);
    }
    separated.push_unseparated(") ORDER BY rowid");
    let recipients: Vec<RecipientRow> = query
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to find chat recipients"))?;

    let mut by_chat: HashMap<ChatId, Vec<ChatRecipient>> = HashMap::new();
    for r in recipients {
        by_chat.entry(r.chat_id).or_default().push(ChatRecipient {
            id: r.user_id,
            nickname: r.nickname,
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| Chat {
            recipients: by_chat.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            chat_type: row.chat_type,
            last_message_id: row.last_message_id,
        })
        .collect())
}
