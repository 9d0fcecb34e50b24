//! Connection session management for Gridlink.
//!
//! This crate owns the socket side of the trading protocol:
//!
//! 1. **Session lifetime** — [`TcpSession`]: connect, initial announce,
//!    cooperative stop, closed signal.
//! 2. **The two duties** — an inbound read loop and an outbound write
//!    loop running concurrently over one connection, coordinated by a
//!    single cancellation signal.
//! 3. **Liveness** — `PINGREQ` echo handling and round-trip measurement
//!    ([`PingTracker`]), independent of application scheduling.
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestrator (above)  ← policy: auto-accept, offers, restart
//!     ↕
//! Session Layer (this crate)  ← socket ownership, queue, dispatch
//!     ↕
//! Protocol Layer (below)  ← line codec, typed messages
//! ```

mod config;
mod connection;
mod error;
mod ping;
mod provider;
mod queue;

pub use config::SessionConfig;
pub use connection::TcpSession;
pub use error::SessionError;
pub use ping::PingTracker;
pub use provider::{MessageHandler, StateProvider};
pub use queue::OutboundQueue;
