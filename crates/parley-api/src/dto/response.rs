//! Response DTOs.

use serde::{Deserialize, Serialize};

use parley_auth::session::LoginResult;
use parley_core::model::Message;
use parley_core::types::{SessionId, UserId};
use parley_realtime::metrics::MetricsSnapshot;

/// A freshly issued session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub user_id: UserId,
    pub session_id: SessionId,
}

impl From<LoginResult> for TokenResponse {
    fn from(login: LoginResult) -> Self {
        Self {
            token: login.token,
            user_id: login.session.user_id,
            session_id: login.session.id,
        }
    }
}

/// `GET /api/auth/user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: UserId,
    pub username: String,
}

/// A stored message plus the caller's correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessageResponse {
    #[serde(flatten)]
    pub message: Message,
    #[serde(rename = "ackId", default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<String>,
}

/// Plain confirmation text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the pool answered a trivial query.
    pub database: bool,
    pub version: String,
    pub connections: usize,
    pub online_users: usize,
    pub metrics: MetricsSnapshot,
}
