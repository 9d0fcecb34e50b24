//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one connection session.
///
/// The defaults match the reference cadence: a full `STATE` broadcast
/// every 2 seconds and a ping probe every 5. Both timers live inside the
/// outbound write loop — there is exactly one state timer, so changing
/// the broadcast interval never produces duplicate state spam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Broker host name or address.
    pub host: String,

    /// Broker TCP port.
    pub port: u16,

    /// How often to broadcast a fresh `STATE` snapshot.
    pub broadcast_interval: Duration,

    /// How often to send a `PINGREQ` probe.
    pub ping_interval: Duration,

    /// Maximum accepted line length, in bytes. A peer sending a longer
    /// line is treated as a transport fault, not a decode failure.
    pub max_line_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4230,
            broadcast_interval: Duration::from_millis(2000),
            ping_interval: Duration::from_millis(5000),
            max_line_bytes: 16 * 1024,
        }
    }
}

impl SessionConfig {
    /// The `host:port` string this session dials.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
