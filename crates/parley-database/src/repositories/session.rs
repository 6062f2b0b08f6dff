//! Session repository implementation.

use chrono::{DateTime, Utc};

use parley_core::error::AppError;
use parley_core::model::Session;
use parley_core::result::AppResult;
use parley_core::types::{SessionId, UserId};

use crate::connection::{Database, db_error};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: SessionId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: i64,
}

impl TryFrom<SessionRow> for Session {
    type Error = AppError;

    fn try_from(row: SessionRow) -> AppResult<Self> {
        let expires_at = DateTime::from_timestamp(row.expires_at, 0)
            .ok_or_else(|| AppError::database(format!("Session {} has an invalid expiry", row.id)))?;
        Ok(Session {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at,
        })
    }
}

/// Repository for session CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: Database,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find a session by ID.
    pub async fn find_by_id(&self, id: SessionId) -> AppResult<Option<Session>> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(db_error("Failed to find session"))?;
        row.map(Session::try_from).transpose()
    }

    /// Insert a new session for `user_id` expiring at `expires_at`.
    pub async fn create(&self, user_id: UserId, expires_at: DateTime<Utc>) -> AppResult<Session> {
        let session = Session {
            id: SessionId::new(),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };
        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(session.id)
            .bind(session.user_id)
            .bind(session.created_at)
            .bind(session.expires_at.timestamp())
            .execute(self.db.pool())
            .await
            .map_err(db_error("Failed to create session"))?;
        Ok(session)
    }

    /// Move a session's expiry. Returns `false` if the session is gone.
    pub async fn touch(&self, id: SessionId, expires_at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
            .bind(expires_at.timestamp())
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(db_error("Failed to touch session"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a session. Returns `false` if it did not exist.
    pub async fn delete(&self, id: SessionId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(db_error("Failed to delete session"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session that expired at or before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(self.db.pool())
            .await
            .map_err(db_error("Failed to delete expired sessions"))?;
        Ok(result.rows_affected())
    }
}
