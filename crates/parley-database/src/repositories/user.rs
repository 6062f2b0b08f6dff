//! User and relationship repository implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use parley_core::error::AppError;
use parley_core::model::{Relation, RelationStatus, User};
use parley_core::result::AppResult;
use parley_core::types::UserId;

use crate::connection::{Database, Tx, db_error, is_unique_violation};

const USER_COLUMNS: &str = "id, username, password_hash, created_at";
const SELECT_BY_ID: &str = "SELECT id, username, password_hash, created_at FROM users WHERE id = ?";
// The column is declared COLLATE NOCASE.
const SELECT_BY_USERNAME: &str =
    "SELECT id, username, password_hash, created_at FROM users WHERE username = ?";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, relations: Vec<Relation>) -> User {
        User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            relations,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RelationRow {
    owner_id: UserId,
    other_id: UserId,
    status: RelationStatus,
}

impl From<RelationRow> for Relation {
    fn from(row: RelationRow) -> Self {
        Relation {
            id: row.other_id,
            status: row.status,
        }
    }
}

/// Repository for users and the relationship rows they own.
///
/// Reads take a pooled connection. The `_in_tx` methods run inside a caller's
/// transaction so a friend operation commits both sides together.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new user; usernames are unique ignoring ASCII case.
    pub async fn create(&self, user: User) -> AppResult<User> {
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Username is taken.")
                } else {
                    db_error("Failed to create user")(e)
                }
            })?;
        Ok(user)
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let mut conn = self.db.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        load_by_id(&mut conn, id).await
    }

    /// Find a user by username, ignoring ASCII case.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let mut conn = self.db.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        load_by_username(&mut conn, username).await
    }

    /// Fetch every user in `ids` that exists, in the order given.
    pub async fn find_many(&self, ids: &[UserId]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.db.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        push_ids(&mut query, ids);
        let rows: Vec<UserRow> = query
            .build_query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to find users"))?;

        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT owner_id, other_id, status FROM relations WHERE owner_id IN (");
        push_ids(&mut query, ids);
        query.push(" ORDER BY rowid");
        let relations: Vec<RelationRow> = query
            .build_query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to find relations"))?;

        let mut by_id: HashMap<UserId, UserRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let mut owned: HashMap<UserId, Vec<Relation>> = HashMap::new();
        for row in relations {
            owned.entry(row.owner_id).or_default().push(Relation::from(row));
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                let row = by_id.remove(id)?;
                let relations = owned.remove(id).unwrap_or_default();
                Some(row.into_user(relations))
            })
            .collect())
    }

    /// Find a user by ID inside `tx`.
    pub async fn find_by_id_in_tx(&self, tx: &mut Tx<'_>, id: UserId) -> AppResult<Option<User>> {
        load_by_id(tx, id).await
    }

    /// Find a user by username inside `tx`, ignoring ASCII case.
    pub async fn find_by_username_in_tx(&self, tx: &mut Tx<'_>, username: &str) -> AppResult<Option<User>> {
        load_by_username(tx, username).await
    }

    /// State `owner` holds toward `other`, if any row exists.
    pub async fn relation_in_tx(
        &self,
        tx: &mut Tx<'_>,
        owner: UserId,
        other: UserId,
    ) -> AppResult<Option<RelationStatus>> {
        sqlx::query_scalar("SELECT status FROM relations WHERE owner_id = ? AND other_id = ?")
            .bind(owner)
            .bind(other)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to read relation"))
    }

    /// Insert or overwrite the state `owner` holds toward `other`.
    pub async fn set_relation_in_tx(
        &self,
        tx: &mut Tx<'_>,
        owner: UserId,
        other: UserId,
        status: RelationStatus,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO relations (owner_id, other_id, status) VALUES (?, ?, ?) \
             ON CONFLICT (owner_id, other_id) DO UPDATE SET status = excluded.status",
        )
        .bind(owner)
        .bind(other)
        .bind(status)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to write relation"))?;
        Ok(())
    }

    /// Drop the row `owner` holds toward `other`. Returns `false` if there was none.
    pub async fn remove_relation_in_tx(&self, tx: &mut Tx<'_>, owner: UserId, other: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM relations WHERE owner_id = ? AND other_id = ?")
            .bind(owner)
            .bind(other)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete relation"))?;
        Ok(result.rows_affected() > 0)
    }
}

async fn load_by_id(conn: &mut SqliteConnection, id: UserId) -> AppResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(SELECT_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to find user"))?;
    match row {
        Some(row) => with_relations(conn, row).await.map(Some),
        None => Ok(None),
    }
}

async fn load_by_username(conn: &mut SqliteConnection, username: &str) -> AppResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(SELECT_BY_USERNAME)
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to find user by username"))?;
    match row {
        Some(row) => with_relations(conn, row).await.map(Some),
        None => Ok(None),
    }
}

async fn with_relations(conn: &mut SqliteConnection, row: UserRow) -> AppResult<User> {
    let relations: Vec<RelationRow> =
        sqlx::query_as("SELECT owner_id, other_id, status FROM relations WHERE owner_id = ? ORDER BY rowid")
            .bind(row.id)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to find relations"))?;
    Ok(row.into_user(relations.into_iter().map(Relation::from).collect()))
}

fn push_ids(query: &mut QueryBuilder<'_, Sqlite>, ids: &[UserId]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
