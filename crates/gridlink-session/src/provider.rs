//! Collaborator hooks: state provision and inbound dispatch.
//!
//! The session does not know anything about the game embedding it.
//! Instead it is handed two capabilities at connect time:
//!
//! - a [`StateProvider`] that can produce the city's publishable snapshot
//!   on demand (the session calls it on every broadcast tick), and
//! - a [`MessageHandler`] that receives every decoded inbound message.
//!
//! Both are plain traits so the embedding application can wire in real
//! game state in production and scripted fixtures in tests, without the
//! session changing at all.

use gridlink_protocol::{LocalState, Message};

use crate::OutboundQueue;

/// Supplies the local city's publishable state on demand.
///
/// Called from the outbound write loop on every broadcast tick, so it
/// must be fast and side-effect-free: take the snapshot, return it, done.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` — the provider is shared with the session's
/// Tokio tasks, which may run on any thread and outlive the caller's
/// stack frame.
pub trait StateProvider: Send + Sync + 'static {
    /// Returns a fresh snapshot of this peer's publishable metrics.
    fn local_state(&self) -> LocalState;
}

/// Receives every decoded inbound message.
///
/// Invoked from the inbound read loop, one message at a time, in exact
/// wire order. Implementations must not block — a slow handler stalls
/// all subsequent inbound processing.
///
/// Ping traffic never reaches the handler: `PINGREQ` is answered and
/// `PINGRSP` is consumed inside the session itself, so liveness does not
/// depend on application-level scheduling.
///
/// Messages pushed to `outbound` from within a single `on_message` call
/// are written back-to-back — the periodic state broadcast never lands
/// between them.
pub trait MessageHandler: Send + Sync + 'static {
    /// Handles one inbound message.
    fn on_message(&self, message: Message, outbound: &OutboundQueue);

    /// Called exactly once when the session has fully closed (both loops
    /// stopped), whether by `stop()`, peer close, or a transport fault.
    fn on_closed(&self) {}
}
