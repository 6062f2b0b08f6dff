//! Expired session cleanup.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use parley_core::result::AppResult;
use parley_database::repositories::SessionRepository;

/// Periodically deletes sessions whose expiry has passed.
#[derive(Clone)]
pub struct SessionCleanup {
    session_repo: Arc<SessionRepository>,
    /// Time between cycles.
    interval: Duration,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup")
            .field("interval", &self.interval)
            .finish()
    }
}

impl SessionCleanup {
    /// Creates a new session cleanup handler.
    pub fn new(session_repo: Arc<SessionRepository>, interval: Duration) -> Self {
        Self {
            session_repo,
            interval,
        }
    }

    /// Runs one cleanup cycle.
    ///
    /// Returns the number of sessions removed.
    pub async fn run_cleanup(&self) -> AppResult<u64> {
        let removed = self.session_repo.delete_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Session cleanup completed");
        }
        Ok(removed)
    }

    /// Runs a cycle every `interval` until `cancel` fires. A failed cycle is
    /// logged and the loop carries on.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval_seconds = self.interval.as_secs(), "Session cleanup started");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Session cleanup failed");
                    }
                }
            }
        }
        info!("Session cleanup stopped");
    }
}
