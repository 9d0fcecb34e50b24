//! `RegionClient`: the application-level policy layer.
//!
//! This is where state provision, liveness, and negotiation meet. The
//! client owns the trade registry, builds sessions from configuration,
//! relays broker snapshots to the UI collaborators, runs the auto-accept
//! policy, and exposes the offer/decision surface to the host game.

use std::sync::{Arc, Mutex as StdMutex};

use gridlink_protocol::{Message, Proposal, Resource};
use gridlink_session::{
    MessageHandler, OutboundQueue, StateProvider, TcpSession,
};
use gridlink_trade::TradeRegistry;
use tokio::sync::Mutex;

use crate::{ClientConfig, ClientError, RegionEvents};

/// A connected city in the regional economy.
///
/// One `RegionClient` represents one player's city. It holds at most one
/// live [`TcpSession`] at a time: `connect` refuses to overlap sessions,
/// and `restart` fully tears the old one down before dialing again.
///
/// All methods take `&self`, so the client can sit in an `Arc` shared
/// between the game thread and UI handlers.
pub struct RegionClient<P: StateProvider, E: RegionEvents> {
    config: Mutex<ClientConfig>,
    provider: Arc<P>,
    events: Arc<E>,
    /// The market view. A `std` mutex, not a Tokio one: it is locked
    /// only for short synchronous sections, from the inbound dispatch
    /// and from snapshot accessors.
    registry: Arc<StdMutex<TradeRegistry>>,
    session: Mutex<Option<TcpSession>>,
}

impl<P: StateProvider, E: RegionEvents> RegionClient<P, E> {
    /// Creates a disconnected client.
    pub fn new(config: ClientConfig, provider: P, events: E) -> Self {
        Self {
            config: Mutex::new(config),
            provider: Arc::new(provider),
            events: Arc::new(events),
            registry: Arc::new(StdMutex::new(TradeRegistry::new())),
            session: Mutex::new(None),
        }
    }

    /// Connects to the broker and starts the session.
    ///
    /// # Errors
    /// - [`ClientError::AlreadyConnected`] — a live session exists.
    /// - [`ClientError::InvalidConfig`] — the player name is empty.
    /// - [`ClientError::Session`] — the transport could not be
    ///   established; the client stays disconnected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        // Holding the slot lock across the dial serializes concurrent
        // connect calls — overlapping sessions are forbidden.
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(|live| !live.is_closed()) {
            return Err(ClientError::AlreadyConnected);
        }

        let config = self.config.lock().await.clone();
        let player_name = config.player_name.trim().to_string();
        if player_name.is_empty() {
            return Err(ClientError::InvalidConfig(
                "player name must not be empty".into(),
            ));
        }

        // Fresh connection, fresh market view: the proposal snapshot is
        // stale and the auto-decide set is scoped to one connection.
        *self.registry() = TradeRegistry::new();

        let dispatch = Arc::new(Dispatch {
            events: Arc::clone(&self.events),
            registry: Arc::clone(&self.registry),
            player_name: player_name.clone(),
            auto_accept: config.auto_accept,
        });

        let live = TcpSession::connect(
            config.session_config(),
            Arc::clone(&self.provider),
            dispatch,
        )
        .await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            player = %player_name,
            auto_accept = config.auto_accept,
            "joined region"
        );
        *session = Some(live);
        Ok(())
    }

    /// Stops the session and waits for full teardown. Idempotent — a
    /// disconnected client stays disconnected.
    pub async fn disconnect(&self) {
        let taken = self.session.lock().await.take();
        if let Some(live) = taken {
            live.stop();
            live.closed().await;
            tracing::info!("left region");
        }
    }

    /// Applies new settings: tears the current session down completely,
    /// then connects with the updated endpoint/identity.
    pub async fn restart(&self, config: ClientConfig) -> Result<(), ClientError> {
        self.disconnect().await;
        *self.config.lock().await = config;
        self.connect().await
    }

    /// Whether a live session exists right now.
    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|live| !live.is_closed())
    }

    /// The latest measured ping round trip, if connected and measured.
    pub async fn latency_ms(&self) -> Option<u32> {
        self.session
            .lock()
            .await
            .as_ref()
            .and_then(TcpSession::latency_ms)
    }

    // -- Negotiation surface ----------------------------------------------

    /// Offers a resource to any peer (empty buyer = public offer).
    pub async fn create_public_offer(
        &self,
        resource: Resource,
        units_per_tick: i32,
        price_per_tick: i32,
    ) -> Result<(), ClientError> {
        self.send_offer(String::new(), resource, units_per_tick, price_per_tick)
            .await
    }

    /// Offers a resource to one specific peer.
    ///
    /// # Errors
    /// [`ClientError::InvalidOffer`] for an empty buyer (that would be a
    /// public offer — use [`create_public_offer`](Self::create_public_offer))
    /// or a buyer equal to this player.
    pub async fn create_targeted_offer(
        &self,
        buyer: &str,
        resource: Resource,
        units_per_tick: i32,
        price_per_tick: i32,
    ) -> Result<(), ClientError> {
        let buyer = buyer.trim();
        if buyer.is_empty() {
            return Err(ClientError::InvalidOffer(
                "targeted offer needs a buyer".into(),
            ));
        }
        self.send_offer(buyer.to_string(), resource, units_per_tick, price_per_tick)
            .await
    }

    async fn send_offer(
        &self,
        buyer: String,
        resource: Resource,
        units: i32,
        price_per_tick: i32,
    ) -> Result<(), ClientError> {
        let seller = self.player_name().await;
        if !buyer.is_empty() && buyer.to_lowercase() == seller.to_lowercase() {
            return Err(ClientError::InvalidOffer(
                "cannot target an offer at yourself".into(),
            ));
        }
        // No id anywhere in the request: the broker assigns proposal ids
        // and stays the single source of truth for the outstanding set.
        self.enqueue(Message::ContractRequest {
            seller,
            buyer,
            resource,
            units,
            price_per_tick,
        })
        .await
    }

    /// Sends a manual decision on a proposal.
    ///
    /// Always sent — even for an id the auto-accept policy has already
    /// decided. A human operator's intent is authoritative, so manual
    /// decisions bypass the dedup set entirely.
    pub async fn decide(
        &self,
        proposal_id: &str,
        accept: bool,
    ) -> Result<(), ClientError> {
        let player = self.player_name().await;
        self.enqueue(Message::ContractDecision {
            proposal_id: proposal_id.to_string(),
            player,
            accept,
        })
        .await
    }

    /// Enqueues a raw message on the live session.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] if no live session exists.
    pub async fn enqueue(&self, message: Message) -> Result<(), ClientError> {
        let session = self.session.lock().await;
        match session.as_ref().filter(|live| !live.is_closed()) {
            Some(live) => {
                live.enqueue(message);
                Ok(())
            }
            None => Err(ClientError::NotConnected),
        }
    }

    // -- Snapshot accessors -----------------------------------------------

    /// The current outstanding-proposal snapshot.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.registry().proposals().to_vec()
    }

    /// The current active-contract snapshot (opaque display text).
    pub fn contracts(&self) -> Vec<String> {
        self.registry().contracts().to_vec()
    }

    async fn player_name(&self) -> String {
        self.config.lock().await.player_name.trim().to_string()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, TradeRegistry> {
        // Nothing panics while holding this lock (user callbacks run
        // outside it), so poisoning cannot occur in practice.
        self.registry.lock().expect("trade registry lock poisoned")
    }
}

// ---------------------------------------------------------------------------
// Inbound dispatch
// ---------------------------------------------------------------------------

/// The client's [`MessageHandler`]: one per connection, capturing the
/// identity and policy that were configured at connect time.
struct Dispatch<E: RegionEvents> {
    events: Arc<E>,
    registry: Arc<StdMutex<TradeRegistry>>,
    player_name: String,
    auto_accept: bool,
}

impl<E: RegionEvents> Dispatch<E> {
    fn registry(&self) -> std::sync::MutexGuard<'_, TradeRegistry> {
        self.registry.lock().expect("trade registry lock poisoned")
    }
}

impl<E: RegionEvents> MessageHandler for Dispatch<E> {
    fn on_message(&self, message: Message, outbound: &OutboundQueue) {
        match message {
            Message::State(state) => {
                self.events.on_state_received(state);
            }

            Message::Proposals(list) => {
                // Replace and decide under one lock: no window between
                // "saw the proposal" and "decided on it".
                let (decisions, snapshot) = {
                    let mut registry = self.registry();
                    registry.replace_proposals(list);
                    let decisions = if self.auto_accept {
                        registry.evaluate_auto_accept(&self.player_name)
                    } else {
                        Vec::new()
                    };
                    (decisions, registry.proposals().to_vec())
                };
                // Enqueued synchronously within this dispatch step, so
                // the decisions go out back-to-back, ahead of any later
                // broadcast.
                for decision in decisions {
                    outbound.push(decision);
                }
                self.events.on_proposals_updated(&snapshot);
            }

            Message::Contracts(list) => {
                self.registry().replace_contracts(list.clone());
                self.events.on_contracts_updated(&list);
            }

            Message::PlayerList { raw } => {
                self.events.on_player_list(&raw);
            }

            // Requests and decisions flow client → broker; one arriving
            // here is a confused peer, not a fault.
            other => {
                tracing::debug!(
                    tag = other.tag(),
                    "ignoring unexpected inbound message"
                );
            }
        }
    }

    fn on_closed(&self) {
        self.events.on_disconnected();
    }
}
