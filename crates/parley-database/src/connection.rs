//! SQLite connection pool management and the transaction boundary.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use parley_core::config::database::DatabaseConfig;
use parley_core::error::{AppError, ErrorKind};
use parley_core::result::AppResult;

use crate::migration::run_migrations;

/// An open write transaction. Dropping it without [`commit`] rolls back.
pub type Tx<'c> = Transaction<'c, Sqlite>;

/// Wrapper around the sqlx SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool described by `config` and bring the schema up to date.
    ///
    /// Every connection to `sqlite::memory:` is its own database, so an
    /// in-memory pool holds exactly one connection and never recycles it.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let in_memory = config.is_in_memory();
        info!(
            url = %config.url,
            in_memory,
            max_connections = config.max_connections,
            "Opening SQLite database"
        );

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid database URL: {e}"),
                    e,
                )
            })?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let pool_options =
            SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));
        let pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to open database: {e}"),
                e,
            )
        })?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// A fresh, migrated private database.
    pub async fn in_memory() -> AppResult<Self> {
        Self::connect(&DatabaseConfig::default()).await
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction.
    ///
    /// Nothing else may touch the pool while it is open: an in-memory pool
    /// has a single connection and the transaction holds it.
    pub async fn begin(&self) -> AppResult<Tx<'static>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Make every write in `tx` visible at once.
pub async fn commit(tx: Tx<'_>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e))?;
    debug!("Transaction committed");
    Ok(())
}

/// Map a sqlx error into a database [`AppError`] carrying `context`.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Whether `err` is a UNIQUE or PRIMARY KEY violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated_and_healthy() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.health_check().await.unwrap());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec!["chat_recipients", "chats", "messages", "relations", "sessions", "users"]
        );
    }

    #[tokio::test]
    async fn test_two_in_memory_databases_are_isolated() {
        let a = Database::in_memory().await.unwrap();
        let b = Database::in_memory().await.unwrap();
        sqlx::query("INSERT INTO chats (id, chat_type) VALUES (x'01', 'Group')")
            .execute(a.pool())
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(b.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_memory_urls_are_detected() {
        let mut config = DatabaseConfig::default();
        assert!(config.is_in_memory());
        config.url = "sqlite://parley.db".into();
        assert!(!config.is_in_memory());
    }
}
