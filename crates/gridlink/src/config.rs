//! Client configuration.

use std::time::Duration;

use gridlink_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a [`RegionClient`](crate::RegionClient).
///
/// This is the host game's settings surface: endpoint, identity, and the
/// auto-accept policy switch. Changing any of it while connected goes
/// through [`restart`](crate::RegionClient::restart) — settings are
/// captured at connect time, never hot-swapped under a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Broker host name or address.
    pub host: String,

    /// Broker TCP port.
    pub port: u16,

    /// This city's player name. Trimmed before use; must be non-empty.
    pub player_name: String,

    /// Whether eligible proposals are accepted automatically.
    pub auto_accept: bool,

    /// How often to broadcast a fresh `STATE` snapshot.
    pub broadcast_interval: Duration,

    /// How often to probe the broker with `PINGREQ`.
    pub ping_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            host: session.host,
            port: session.port,
            player_name: String::new(),
            auto_accept: false,
            broadcast_interval: session.broadcast_interval,
            ping_interval: session.ping_interval,
        }
    }
}

impl ClientConfig {
    /// The session-layer view of this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            host: self.host.clone(),
            port: self.port,
            broadcast_interval: self.broadcast_interval,
            ping_interval: self.ping_interval,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_session_defaults() {
        let config = ClientConfig::default();
        let session = SessionConfig::default();
        assert_eq!(config.port, session.port);
        assert_eq!(config.broadcast_interval, session.broadcast_interval);
        assert!(!config.auto_accept);
    }

    #[test]
    fn test_session_config_carries_endpoint_and_cadence() {
        let config = ClientConfig {
            host: "broker.example".into(),
            port: 9999,
            broadcast_interval: Duration::from_millis(500),
            ..Default::default()
        };
        let session = config.session_config();
        assert_eq!(session.addr(), "broker.example:9999");
        assert_eq!(session.broadcast_interval, Duration::from_millis(500));
    }
}
