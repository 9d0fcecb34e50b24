//! Integration tests for the connection session.
//!
//! These tests run a real loopback TCP peer (a scripted stand-in for the
//! region broker) and verify that lines actually flow over the socket
//! correctly: the initial announce, ping echo, enqueue ordering, the
//! broadcast cadence, and teardown on close or stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridlink_protocol::{LocalState, Message, UtilityStats};
use gridlink_session::{
    MessageHandler, OutboundQueue, SessionConfig, SessionError, StateProvider,
    TcpSession,
};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

/// How long a test waits for an expected line before failing.
const WAIT: Duration = Duration::from_secs(5);

/// A quiet interval: long enough that no timer fires during a test.
const QUIET: Duration = Duration::from_secs(600);

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Provider returning the same scripted snapshot every tick.
struct FixedProvider(LocalState);

impl StateProvider for FixedProvider {
    fn local_state(&self) -> LocalState {
        self.0.clone()
    }
}

fn bob_state() -> LocalState {
    LocalState {
        player_name: "Bob".into(),
        money: 100_000,
        population: 1_500,
        electricity: UtilityStats::new(100, 80, 0),
        water: UtilityStats::new(50, 40, 0),
        sewage: UtilityStats::new(50, 45, 0),
        sim_speed: 1,
        sim_date: "Jan 1".into(),
        ..Default::default()
    }
}

/// Handler that records every dispatched message and the close signal.
#[derive(Default)]
struct RecordingHandler {
    messages: Mutex<Vec<Message>>,
    closed: AtomicBool,
}

impl MessageHandler for RecordingHandler {
    fn on_message(&self, message: Message, _outbound: &OutboundQueue) {
        self.messages.lock().unwrap().push(message);
    }

    fn on_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// The scripted broker end of the wire.
struct TestBroker {
    reader: FramedRead<OwnedReadHalf, LinesCodec>,
    writer: FramedWrite<OwnedWriteHalf, LinesCodec>,
}

impl TestBroker {
    async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = timeout(WAIT, listener.accept())
            .await
            .expect("accept timed out")
            .expect("accept failed");
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: FramedRead::new(read_half, LinesCodec::new()),
            writer: FramedWrite::new(write_half, LinesCodec::new()),
        }
    }

    /// Reads the next line, failing the test on close or timeout.
    async fn next_line(&mut self) -> String {
        timeout(WAIT, self.reader.next())
            .await
            .expect("read timed out")
            .expect("broker saw unexpected close")
            .expect("broker read failed")
    }

    /// Asserts that no line arrives within the given window.
    async fn expect_silence(&mut self, window: Duration) {
        if let Ok(item) = timeout(window, self.reader.next()).await {
            panic!("expected silence, got {item:?}");
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.writer
            .send(line.to_string())
            .await
            .expect("broker write failed");
    }
}

/// Binds a loopback listener and builds a session config pointing at it.
async fn listener_and_config() -> (TcpListener, SessionConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let config = SessionConfig {
        host: "127.0.0.1".into(),
        port,
        broadcast_interval: QUIET,
        ping_interval: QUIET,
        ..Default::default()
    };
    (listener, config)
}

async fn connect(
    config: SessionConfig,
) -> (TcpSession, Arc<RecordingHandler>) {
    let handler = Arc::new(RecordingHandler::default());
    let session = TcpSession::connect(
        config,
        Arc::new(FixedProvider(bob_state())),
        Arc::clone(&handler),
    )
    .await
    .expect("connect should succeed");
    (session, handler)
}

// ---------------------------------------------------------------------------
// Connect / announce
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_connect_sends_initial_state_announce() {
    let (listener, config) = listener_and_config().await;
    let (_session, _handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;

    let line = broker.next_line().await;
    assert!(line.starts_with("STATE|Bob|"), "got {line:?}");
    assert_eq!(
        gridlink_protocol::codec::decode(&line).unwrap(),
        Message::State(bob_state()),
    );
}

#[tokio::test]
async fn test_connect_without_listener_fails_fast() {
    let (listener, config) = listener_and_config().await;
    drop(listener);

    let result = TcpSession::connect(
        config,
        Arc::new(FixedProvider(bob_state())),
        Arc::new(RecordingHandler::default()),
    )
    .await;

    assert!(matches!(result, Err(SessionError::Connect { .. })));
}

// ---------------------------------------------------------------------------
// Ping echo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ping_request_is_answered_with_exact_echo() {
    let (listener, config) = listener_and_config().await;
    let (_session, handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;
    broker.next_line().await; // initial STATE

    broker.send_line("PINGREQ|42").await;

    assert_eq!(broker.next_line().await, "PINGRSP|42");
    // ...and nothing else: no broadcast, no second echo.
    broker.expect_silence(Duration::from_millis(200)).await;
    // The echo happened below the handler — it never saw the ping.
    assert!(handler.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ping_round_trip_updates_latency() {
    let (listener, mut config) = listener_and_config().await;
    config.ping_interval = Duration::from_millis(50);
    let (session, _handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;
    broker.next_line().await; // initial STATE

    assert_eq!(session.latency_ms(), None);

    // Echo the first probe back.
    let line = broker.next_line().await;
    let id = line
        .strip_prefix("PINGREQ|")
        .unwrap_or_else(|| panic!("expected PINGREQ, got {line:?}"));
    broker.send_line(&format!("PINGRSP|{id}")).await;

    // The reader completes the round trip shortly after.
    timeout(WAIT, async {
        while session.latency_ms().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("latency should be measured");
}

// ---------------------------------------------------------------------------
// Outbound ordering and broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_enqueued_messages_are_written_in_order() {
    let (listener, config) = listener_and_config().await;
    let (session, _handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;
    broker.next_line().await; // initial STATE

    for id in ["a", "b", "c"] {
        session.enqueue(Message::ContractDecision {
            proposal_id: id.into(),
            player: "Bob".into(),
            accept: true,
        });
    }

    assert_eq!(broker.next_line().await, "CONTRACTDECISION|a|Bob|1");
    assert_eq!(broker.next_line().await, "CONTRACTDECISION|b|Bob|1");
    assert_eq!(broker.next_line().await, "CONTRACTDECISION|c|Bob|1");
}

#[tokio::test]
async fn test_broadcast_interval_sends_fresh_state() {
    let (listener, mut config) = listener_and_config().await;
    config.broadcast_interval = Duration::from_millis(100);
    let (_session, _handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;
    broker.next_line().await; // initial STATE

    // Two more broadcasts arrive on the timer alone.
    for _ in 0..2 {
        let line = broker.next_line().await;
        assert!(line.starts_with("STATE|Bob|"), "got {line:?}");
    }
}

// ---------------------------------------------------------------------------
// Inbound dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_inbound_messages_dispatched_in_wire_order() {
    let (listener, config) = listener_and_config().await;
    let (_session, handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;
    broker.next_line().await;

    broker
        .send_line("PROPOSALS|id1,Alice,,0,2000000,1")
        .await;
    broker.send_line("CONTRACTS|deal%201").await;
    // Give the reader a moment to dispatch both.
    timeout(WAIT, async {
        while handler.messages.lock().unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("both messages should be dispatched");

    let messages = handler.messages.lock().unwrap();
    assert!(matches!(&messages[0], Message::Proposals(list) if list.len() == 1));
    assert_eq!(
        messages[1],
        Message::Contracts(vec!["deal 1".to_string()])
    );
}

#[tokio::test]
async fn test_malformed_line_is_dropped_and_session_continues() {
    let (listener, config) = listener_and_config().await;
    let (_session, handler) = connect(config).await;
    let mut broker = TestBroker::accept(&listener).await;
    broker.next_line().await;

    broker.send_line("GARBAGE|not|a|message").await;
    broker.send_line("PINGREQ|7").await;

    // The bad line neither killed the loop nor desynced framing.
    assert_eq!(broker.next_line().await, "PINGRSP|7");
    assert!(handler.messages.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_peer_close_closes_session_and_fires_on_closed() {
    let (listener, config) = listener_and_config().await;
    let (session, handler) = connect(config).await;
    let broker = TestBroker::accept(&listener).await;
    drop(broker);

    timeout(WAIT, session.closed()).await.expect("should close");
    assert!(session.is_closed());
    assert!(handler.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_stop_is_prompt_and_idempotent() {
    let (listener, config) = listener_and_config().await;
    let (session, handler) = connect(config).await;
    let _broker = TestBroker::accept(&listener).await;

    session.stop();
    session.stop(); // second stop is a no-op

    // Both duties were parked on quiet timers and an idle socket; stop
    // must not wait them out.
    timeout(Duration::from_secs(1), session.closed())
        .await
        .expect("stop should tear down promptly");
    assert!(handler.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_enqueue_after_close_is_silent() {
    let (listener, config) = listener_and_config().await;
    let (session, _handler) = connect(config).await;
    let _broker = TestBroker::accept(&listener).await;

    session.stop();
    timeout(WAIT, session.closed()).await.expect("should close");

    // Nowhere to go, but must not panic or block.
    session.enqueue(Message::PingRequest { id: 1 });
}
