//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Session token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Issuer claim written into and required on every token.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Sliding session lifetime; every successful validation pushes expiry out by this much.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_days: i64,
    /// Reject new registrations.
    #[serde(default)]
    pub disable_signup: bool,
    /// How often expired sessions are purged.
    #[serde(default = "default_cleanup_interval")]
    pub session_cleanup_interval_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            session_ttl_days: default_session_ttl(),
            disable_signup: false,
            session_cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "parley".to_string()
}

fn default_session_ttl() -> i64 {
    30
}

fn default_cleanup_interval() -> u64 {
    900
}
