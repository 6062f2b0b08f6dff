//! Real-time gateway configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Upper bound on identity resolution plus snapshot assembly for a new connection.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_seconds: u64,
    /// Outbound buffer per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum concurrent connections per user (0 = unlimited).
    #[serde(default)]
    pub max_connections_per_user: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_seconds: default_handshake_timeout(),
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: 0,
        }
    }
}

fn default_handshake_timeout() -> u64 {
    5
}

fn default_channel_buffer() -> usize {
    256
}
