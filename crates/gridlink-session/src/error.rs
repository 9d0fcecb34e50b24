//! Error types for the session layer.

/// Errors that can occur while establishing or driving a session.
///
/// Only establishment and the initial announce are fallible from the
/// caller's point of view. Faults inside the running read/write loops
/// are not surfaced as errors — they close the session, and the caller
/// observes that through the closed signal and may reconnect explicitly.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The TCP connection could not be established. Fatal to `connect`;
    /// the session never starts.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// The `host:port` that was dialed.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the initial `STATE` announce failed. The connection was
    /// established but is unusable; the session never starts.
    #[error("initial announce failed: {0}")]
    Announce(#[source] std::io::Error),
}
