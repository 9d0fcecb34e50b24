//! # Gridlink
//!
//! Regional utility trading for multiplayer city simulations.
//!
//! Independent game sessions ("cities") exchange electricity, water, and
//! sewage — plus core state like money, population, and the simulation
//! clock — over a persistent TCP connection to a region broker, so
//! multiple players can run a shared regional economy.
//!
//! The embedding game implements two small traits and gets the whole
//! protocol in return:
//!
//! - [`StateProvider`] — hands the client a fresh snapshot of the city's
//!   publishable metrics on every broadcast tick.
//! - [`RegionEvents`] — receives market updates (peer state, proposals,
//!   contracts) for display.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gridlink::{ClientConfig, LocalState, NoEvents, RegionClient, StateProvider};
//!
//! struct MyCity;
//!
//! impl StateProvider for MyCity {
//!     fn local_state(&self) -> LocalState {
//!         LocalState {
//!             player_name: "Bob".into(),
//!             // ...pull the rest from the running simulation
//!             ..Default::default()
//!         }
//!     }
//! }
//!
//! # async fn run() -> Result<(), gridlink::ClientError> {
//! let config = ClientConfig {
//!     host: "broker.example".into(),
//!     player_name: "Bob".into(),
//!     auto_accept: true,
//!     ..Default::default()
//! };
//! let client = RegionClient::new(config, MyCity, NoEvents);
//! client.connect().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod events;

pub use client::RegionClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use events::{NoEvents, RegionEvents};

// Re-export the protocol and session vocabulary so most embedders only
// need this one crate.
pub use gridlink_protocol::{
    LocalState, Message, Proposal, ProtocolError, Resource, UtilityStats,
};
pub use gridlink_session::{SessionConfig, SessionError, StateProvider};
