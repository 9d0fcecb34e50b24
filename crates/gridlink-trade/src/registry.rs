//! The trade registry: latest market snapshots plus the auto-accept
//! decision state machine.
//!
//! # Concurrency note
//!
//! `TradeRegistry` is NOT thread-safe by itself — plain `Vec`s and a
//! plain `HashSet`, no locks. This is intentional: the registry is
//! mutated only from the session's inbound dispatch step, and the
//! orchestrator wraps it in a mutex for read access from the UI side.
//! Keeping it simple here avoids hidden locking overhead.

use std::collections::HashSet;

use gridlink_protocol::{Message, Proposal};

/// The client's view of the regional trade market.
///
/// The protocol is snapshot-based, not delta-based: each `PROPOSALS` or
/// `CONTRACTS` broadcast carries the complete authoritative list, so both
/// [`replace_proposals`](Self::replace_proposals) and
/// [`replace_contracts`](Self::replace_contracts) discard the prior state
/// entirely. The only state that survives replacement is the auto-decide
/// dedup set, which must span snapshots — the whole point is that a
/// proposal still present in the *next* snapshot is not acted on twice.
#[derive(Debug, Default)]
pub struct TradeRegistry {
    /// Latest outstanding-proposal snapshot.
    proposals: Vec<Proposal>,
    /// Latest active-contract snapshot, opaque display text.
    contracts: Vec<String>,
    /// Ids this client has already auto-decided this connection.
    decided: HashSet<String>,
}

impl TradeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wholesale-replaces the outstanding-proposal list.
    ///
    /// No merge with prior state: a proposal missing from `proposals` is
    /// gone (withdrawn, superseded, or accepted elsewhere), whatever the
    /// previous snapshot said.
    pub fn replace_proposals(&mut self, proposals: Vec<Proposal>) {
        tracing::debug!(count = proposals.len(), "proposal snapshot replaced");
        self.proposals = proposals;
    }

    /// Wholesale-replaces the active-contract list.
    pub fn replace_contracts(&mut self, contracts: Vec<String>) {
        tracing::debug!(count = contracts.len(), "contract snapshot replaced");
        self.contracts = contracts;
    }

    /// Runs the auto-accept policy over the current proposal snapshot.
    ///
    /// A proposal is accepted iff all of:
    /// - its seller is not `local_player` (case-insensitive) — never
    ///   accept your own offer;
    /// - its buyer is empty (public) or is `local_player`
    ///   (case-insensitive) — never accept an offer targeted at someone
    ///   else;
    /// - its id has not already been auto-decided this connection.
    ///
    /// Every accepted id is recorded in the dedup set, so snapshots that
    /// still carry the id produce no further decisions. Returns the
    /// `CONTRACTDECISION` messages to enqueue; the proposal list itself is
    /// untouched (authoritative removal arrives with the broker's next
    /// snapshot).
    pub fn evaluate_auto_accept(&mut self, local_player: &str) -> Vec<Message> {
        let mut decisions = Vec::new();
        for proposal in &self.proposals {
            if !is_acceptable(proposal, local_player) {
                continue;
            }
            if !self.decided.insert(proposal.id.clone()) {
                continue; // already decided this one
            }
            tracing::info!(
                id = %proposal.id,
                seller = %proposal.seller,
                resource = %proposal.resource,
                units = proposal.units,
                price = proposal.price_per_tick,
                "auto-accepting proposal"
            );
            decisions.push(Message::ContractDecision {
                proposal_id: proposal.id.clone(),
                player: local_player.to_string(),
                accept: true,
            });
        }
        decisions
    }

    /// The current outstanding-proposal snapshot.
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// The current active-contract snapshot (opaque display text).
    pub fn contracts(&self) -> &[String] {
        &self.contracts
    }

    /// Number of outstanding proposals.
    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// Number of active contracts.
    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }
}

/// Whether the auto-accept policy may take `proposal` on behalf of
/// `local_player`. Name comparison is case-insensitive because the
/// reference broker treats player names that way.
fn is_acceptable(proposal: &Proposal, local_player: &str) -> bool {
    if eq_player(&proposal.seller, local_player) {
        return false;
    }
    proposal.is_public() || eq_player(&proposal.buyer, local_player)
}

fn eq_player(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// =========================================================================
// Tests
// =========================================================================
