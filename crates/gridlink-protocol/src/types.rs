//! Core protocol types for Gridlink's wire format.
//!
//! This module defines every value that travels "on the wire" between a
//! city client and the trade broker: the full city snapshot ([`LocalState`]),
//! outstanding trade offers ([`Proposal`]), and the [`Message`] enum that
//! wraps one protocol line of each kind.
//!
//! Think of this as the "language" that all peers in a region speak. The
//! actual text layout lives in [`codec`](crate::codec); these types only
//! describe the data.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A tradable utility resource.
///
/// The numeric codes are part of the wire format (`resource` sub-field of
/// proposal entries and `CONTRACTREQ` lines) and must never be renumbered:
/// electricity is `0`, water is `1`, sewage is `2`. Any other code on the
/// wire is a malformed message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Resource {
    /// Electric power, traded in megawatts per tick.
    Electricity,
    /// Fresh water, traded in cubic meters per tick.
    Water,
    /// Sewage treatment capacity, traded in cubic meters per tick.
    Sewage,
}

impl Resource {
    /// The wire code for this resource.
    pub fn code(self) -> u8 {
        match self {
            Self::Electricity => 0,
            Self::Water => 1,
            Self::Sewage => 2,
        }
    }

    /// Parses a wire code. Returns `None` for anything outside {0, 1, 2}.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Electricity),
            1 => Some(Self::Water),
            2 => Some(Self::Sewage),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Electricity => write!(f, "electricity"),
            Self::Water => write!(f, "water"),
            Self::Sewage => write!(f, "sewage"),
        }
    }
}

// ---------------------------------------------------------------------------
// LocalState
// ---------------------------------------------------------------------------

/// Production, consumption, and fulfilled trade volume for one utility.
///
/// `production` is capacity for utilities that have one (electricity) and
/// raw production otherwise; the distinction belongs to the host game, the
/// protocol just relays the number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct UtilityStats {
    /// Production or capacity, in game units per tick.
    pub production: u32,
    /// Consumption, in game units per tick.
    pub consumption: u32,
    /// Amount currently fulfilled through regional trade.
    pub fulfilled: u32,
}

impl UtilityStats {
    /// Convenience constructor, mostly for tests and demo providers.
    pub fn new(production: u32, consumption: u32, fulfilled: u32) -> Self {
        Self {
            production,
            consumption,
            fulfilled,
        }
    }
}

/// A full snapshot of one city's publishable metrics.
///
/// Produced fresh on every broadcast tick by the embedding game's state
/// provider and serialized into a `STATE` line. Immutable once encoded —
/// nothing in the core mutates a snapshot after it is taken, except that
/// the session stamps its own measured round-trip time into [`ping_ms`]
/// just before encoding (the session is the only component that can
/// observe the round trip).
///
/// [`ping_ms`]: LocalState::ping_ms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalState {
    /// Player name. Non-empty and trimmed; free text, so it is
    /// percent-encoded on the wire.
    pub player_name: String,
    /// City treasury. Signed — debt is a perfectly normal city state.
    pub money: i64,
    /// City population.
    pub population: u64,
    /// Electricity production/consumption/fulfilled.
    pub electricity: UtilityStats,
    /// Water production/consumption/fulfilled.
    pub water: UtilityStats,
    /// Sewage production/consumption/fulfilled.
    pub sewage: UtilityStats,
    /// Measured round-trip latency to the broker, in milliseconds.
    pub ping_ms: u32,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Simulation speed multiplier (1–3 in the reference game).
    pub sim_speed: u32,
    /// Human-readable simulation date/time. Free text, percent-encoded.
    pub sim_date: String,
    /// Whether the city has an outside electricity connection
    /// (border trade enabled).
    pub electricity_border: bool,
    /// Whether the city has an outside water connection.
    pub water_border: bool,
    /// Whether the city has an outside sewage connection.
    pub sewage_border: bool,
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// An outstanding trade offer.
///
/// Proposals are created by the broker in response to `CONTRACTREQ` lines;
/// the broker assigns the `id` and is the single source of truth for the
/// outstanding set. A client never invents ids — it only echoes them back
/// in `CONTRACTDECISION` lines. Proposals are immutable after creation and
/// may silently disappear from the next `PROPOSALS` snapshot (withdrawn or
/// superseded by the broker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Opaque identifier, unique per proposal, assigned by the broker.
    /// Never empty in a well-formed entry.
    pub id: String,
    /// The offering player. Never empty in a well-formed entry.
    pub seller: String,
    /// The targeted buyer. Empty means a public offer any peer may accept.
    pub buyer: String,
    /// Which utility is being offered.
    pub resource: Resource,
    /// Amount per tick. Signed.
    pub units: i32,
    /// Price per tick. Signed.
    pub price_per_tick: i32,
}

impl Proposal {
    /// Returns `true` if this is a public (any-buyer) offer.
    pub fn is_public(&self) -> bool {
        self.buyer.is_empty()
    }
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} offers {} {} @ {}/tick",
            self.id, self.seller, self.units, self.resource, self.price_per_tick
        )
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One protocol line, decoded.
///
/// Every variant corresponds to exactly one line tag on the wire; the
/// layout of each is documented in [`codec`](crate::codec). Directionality
/// is conventional, not enforced: a client normally *sends* `State`,
/// `ContractRequest`, and `ContractDecision`, and *receives* `State`,
/// `Proposals`, `Contracts`, and `PlayerList`; ping lines flow both ways.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `STATE` — full snapshot broadcast by a peer.
    State(LocalState),

    /// `PINGREQ` — liveness probe. The recipient must reply with a
    /// `PINGRSP` echoing the id verbatim.
    PingRequest {
        /// Correlation id, assigned by the sender.
        id: u64,
    },

    /// `PINGRSP` — reply to a `PINGREQ`.
    PingResponse {
        /// The echoed correlation id.
        id: u64,
    },

    /// `PROPOSALS` — wholesale replacement of the outstanding-proposal
    /// list. Not a delta: the previous list is discarded entirely.
    Proposals(Vec<Proposal>),

    /// `CONTRACTS` — wholesale replacement of the active-contract list.
    /// Entries are opaque text, relayed unparsed to the display layer.
    Contracts(Vec<String>),

    /// `CONTRACTREQ` — ask the broker to create a new proposal.
    /// Deliberately carries no id: the broker assigns one.
    ContractRequest {
        /// The offering player (this client).
        seller: String,
        /// Targeted buyer, or empty for a public offer.
        buyer: String,
        /// Which utility is offered.
        resource: Resource,
        /// Amount per tick.
        units: i32,
        /// Price per tick.
        price_per_tick: i32,
    },

    /// `CONTRACTDECISION` — accept or refuse a specific proposal.
    ContractDecision {
        /// The id of the proposal being decided.
        proposal_id: String,
        /// The player making the decision.
        player: String,
        /// `true` to accept, `false` to refuse.
        accept: bool,
    },

    /// `LIST` — aggregate snapshot of all peers. The payload structure is
    /// owned by the broker; the core relays it raw.
    PlayerList {
        /// The undecoded payload, everything after the tag.
        raw: String,
    },
}

impl Message {
    /// The wire tag for this message, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::State(_) => "STATE",
            Self::PingRequest { .. } => "PINGREQ",
            Self::PingResponse { .. } => "PINGRSP",
            Self::Proposals(_) => "PROPOSALS",
            Self::Contracts(_) => "CONTRACTS",
            Self::ContractRequest { .. } => "CONTRACTREQ",
            Self::ContractDecision { .. } => "CONTRACTDECISION",
            Self::PlayerList { .. } => "LIST",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Resource
    // =====================================================================

    #[test]
    fn test_resource_code_round_trips() {
        for resource in [Resource::Electricity, Resource::Water, Resource::Sewage] {
            assert_eq!(Resource::from_code(resource.code()), Some(resource));
        }
    }

    #[test]
    fn test_resource_codes_are_wire_stable() {
        // These values are fixed by the wire format — renumbering would
        // silently corrupt every trade in flight.
        assert_eq!(Resource::Electricity.code(), 0);
        assert_eq!(Resource::Water.code(), 1);
        assert_eq!(Resource::Sewage.code(), 2);
    }

    #[test]
    fn test_resource_from_code_rejects_unknown() {
        assert_eq!(Resource::from_code(3), None);
        assert_eq!(Resource::from_code(255), None);
    }

    #[test]
    fn test_resource_display() {
        assert_eq!(Resource::Electricity.to_string(), "electricity");
        assert_eq!(Resource::Sewage.to_string(), "sewage");
    }

    // =====================================================================
    // Proposal
    // =====================================================================

    #[test]
    fn test_proposal_is_public_when_buyer_empty() {
        let proposal = Proposal {
            id: "p-1".into(),
            seller: "Alice".into(),
            buyer: String::new(),
            resource: Resource::Water,
            units: 500,
            price_per_tick: 2,
        };
        assert!(proposal.is_public());
    }

    #[test]
    fn test_proposal_is_not_public_when_targeted() {
        let proposal = Proposal {
            id: "p-2".into(),
            seller: "Alice".into(),
            buyer: "Bob".into(),
            resource: Resource::Water,
            units: 500,
            price_per_tick: 2,
        };
        assert!(!proposal.is_public());
    }

    // =====================================================================
    // Message
    // =====================================================================

    #[test]
    fn test_message_tag_matches_wire_tags() {
        assert_eq!(Message::State(LocalState::default()).tag(), "STATE");
        assert_eq!(Message::PingRequest { id: 1 }.tag(), "PINGREQ");
        assert_eq!(Message::PingResponse { id: 1 }.tag(), "PINGRSP");
        assert_eq!(Message::Proposals(Vec::new()).tag(), "PROPOSALS");
        assert_eq!(Message::Contracts(Vec::new()).tag(), "CONTRACTS");
        assert_eq!(
            Message::PlayerList { raw: String::new() }.tag(),
            "LIST"
        );
    }
}
