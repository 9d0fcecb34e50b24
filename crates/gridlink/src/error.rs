//! Unified error type for the Gridlink client.

use gridlink_session::SessionError;

/// Top-level error for [`RegionClient`](crate::RegionClient) operations.
///
/// Session-layer errors pass through transparently via `#[from]`, so the
/// `?` operator converts them automatically; the remaining variants are
/// client-level policy errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A session-level error (connect, initial announce).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// `connect` was called while a live session exists. One socket, one
    /// session — stop or restart instead.
    #[error("already connected")]
    AlreadyConnected,

    /// The operation needs a live session and there is none.
    #[error("not connected")]
    NotConnected,

    /// The offer violates a client-side invariant (e.g. targeting
    /// yourself as buyer).
    #[error("invalid offer: {0}")]
    InvalidOffer(String),

    /// The configuration cannot produce a valid session (e.g. empty
    /// player name).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let err = SessionError::Connect {
            addr: "broker:4230".into(),
            source: std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            ),
        };
        let client_err: ClientError = err.into();
        assert!(matches!(client_err, ClientError::Session(_)));
        assert!(client_err.to_string().contains("broker:4230"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ClientError::AlreadyConnected.to_string(),
            "already connected"
        );
        assert_eq!(ClientError::NotConnected.to_string(), "not connected");
    }
}
