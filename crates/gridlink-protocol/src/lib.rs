//! Wire protocol for Gridlink.
//!
//! This crate defines the "language" that city clients and the trade
//! broker speak:
//!
//! - **Types** ([`Message`], [`LocalState`], [`Proposal`], [`Resource`]) —
//!   the values that travel on the wire.
//! - **Codec** ([`codec::encode`] / [`codec::decode`]) — how those values
//!   map to pipe-delimited, percent-encoded protocol lines.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the line framing (raw text lines) and
//! the session (socket ownership, dispatch). It performs no I/O and holds
//! no state — every function here is a pure translation.
//!
//! ```text
//! Framing (lines) → Protocol (Message) → Session (dispatch, policy)
//! ```

pub mod codec;
mod error;
mod types;

pub use error::ProtocolError;
pub use types::{LocalState, Message, Proposal, Resource, UtilityStats};
