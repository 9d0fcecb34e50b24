//! Notification callbacks for UI/display collaborators.

use std::sync::Arc;

use gridlink_protocol::{LocalState, Proposal};

/// Events the client raises for its embedding application.
///
/// Every method has a no-op default — implement only what the host UI
/// actually displays. All callbacks run on the session's inbound duty,
/// so they must be non-blocking (defer any heavy work internally); a
/// slow callback stalls all subsequent inbound processing.
pub trait RegionEvents: Send + Sync + 'static {
    /// Another peer's `STATE` snapshot arrived.
    fn on_state_received(&self, _state: LocalState) {}

    /// The outstanding-proposal list was replaced. `proposals` is the
    /// complete new snapshot, after any auto-accept decisions were
    /// already enqueued.
    fn on_proposals_updated(&self, _proposals: &[Proposal]) {}

    /// The active-contract list was replaced. Entries are opaque display
    /// text.
    fn on_contracts_updated(&self, _contracts: &[String]) {}

    /// The broker sent an aggregate peer listing; the payload structure
    /// is the broker's, relayed raw.
    fn on_player_list(&self, _raw: &str) {}

    /// The session closed — peer close, transport fault, or an explicit
    /// stop. Reported exactly once per connection; reconnecting is an
    /// explicit [`connect`](crate::RegionClient::connect) or
    /// [`restart`](crate::RegionClient::restart), never automatic.
    fn on_disconnected(&self) {}
}

/// A collaborator that displays nothing. Useful for headless tooling
/// and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl RegionEvents for NoEvents {}

/// Forward callbacks through a shared handle, so a caller can retain its
/// own `Arc<E>` while the client holds another clone.
impl<T: RegionEvents + ?Sized> RegionEvents for Arc<T> {
    fn on_state_received(&self, state: LocalState) {
        (**self).on_state_received(state);
    }

    fn on_proposals_updated(&self, proposals: &[Proposal]) {
        (**self).on_proposals_updated(proposals);
    }

    fn on_contracts_updated(&self, contracts: &[String]) {
        (**self).on_contracts_updated(contracts);
    }

    fn on_player_list(&self, raw: &str) {
        (**self).on_player_list(raw);
    }

    fn on_disconnected(&self) {
        (**self).on_disconnected();
    }
}
