//! Application state shared across all handlers.

use std::sync::Arc;

use parley_auth::{SessionCleanup, SessionManager};
use parley_core::config::AppConfig;
use parley_database::Database;
use parley_realtime::{Gateway, RealtimeHub};
use parley_service::{ChatService, UserService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Connection pool
    pub db: Database,
    /// Registration, login, token validation
    pub session_manager: Arc<SessionManager>,
    /// Periodic purge of expired sessions
    pub session_cleanup: Arc<SessionCleanup>,
    /// Friend flows
    pub user_service: Arc<UserService>,
    /// Direct messages
    pub chat_service: Arc<ChatService>,
    /// Presence, rooms and fan-out
    pub realtime: Arc<RealtimeHub>,
    /// Socket lifecycle
    pub gateway: Arc<Gateway>,
}
