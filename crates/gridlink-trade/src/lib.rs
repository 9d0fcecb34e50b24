//! Trade state for Gridlink: the proposal/contract registry.
//!
//! This crate holds the client's view of the regional trade market:
//!
//! 1. **Snapshots** — the latest outstanding-proposal and active-contract
//!    lists, replaced wholesale on every broker broadcast.
//! 2. **Auto-accept** — the policy state machine that turns eligible
//!    proposals into `CONTRACTDECISION` messages, at most once per
//!    proposal id for the lifetime of a connection.
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestrator (above)  ← feeds broker snapshots in, sends decisions out
//!     ↕
//! Trade Layer (this crate)  ← pure state machine, no I/O
//!     ↕
//! Protocol Layer (below)  ← provides Proposal, Message types
//! ```

mod registry;

pub use registry::TradeRegistry;
