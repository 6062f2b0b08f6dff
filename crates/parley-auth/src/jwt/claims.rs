//! JWT claims structure carried by every session token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_core::types::{SessionId, UserId};

/// JWT claims payload.
///
/// The token only names a session; whether that session is still alive is
/// decided by the session store, not by `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: UserId,
    /// Session ID this token belongs to.
    pub sid: SessionId,
    /// Issuer.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Hard expiration (seconds since epoch).
    pub exp: i64,
    /// Token ID.
    pub jti: Uuid,
}
