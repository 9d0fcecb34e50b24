//! The TCP connection session: one socket, two duties, one cancellation
//! signal.
//!
//! A [`TcpSession`] owns exactly one TCP connection to the region broker
//! and runs exactly two concurrent duties over it:
//!
//! - the **inbound read loop**, consuming one line at a time, decoding
//!   it, and dispatching to the registered [`MessageHandler`];
//! - the **outbound write loop**, draining the FIFO outbound queue and,
//!   on fixed intervals, writing a fresh `STATE` broadcast and a
//!   `PINGREQ` probe.
//!
//! Both duties suspend cooperatively (socket read; queue/timer wait) and
//! both suspensions are cancellable through one shared `watch` signal, so
//! [`stop`](TcpSession::stop) returns promptly instead of waiting out a
//! timeout. Either duty dying — end-of-stream, read fault, write fault —
//! raises the same signal, which stops the other duty; the handler's
//! `on_closed` fires exactly once, after both have stopped.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use gridlink_protocol::{codec, Message};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::{
    MessageHandler, OutboundQueue, PingTracker, SessionConfig, SessionError,
    StateProvider,
};

type LineReader = FramedRead<OwnedReadHalf, LinesCodec>;
type LineWriter = FramedWrite<OwnedWriteHalf, LinesCodec>;

/// A live connection session.
///
/// Created by [`connect`](Self::connect); dropped or stopped, it cancels
/// its duties and releases the socket. One socket, one reader task, one
/// writer task — a second session never reuses the same connection, and
/// restarting means stopping this session and connecting a new one.
#[derive(Debug)]
pub struct TcpSession {
    outbound: OutboundQueue,
    ping: Arc<PingTracker>,
    shutdown: Arc<watch::Sender<bool>>,
    closed: watch::Receiver<bool>,
}

impl TcpSession {
    /// Opens the connection and starts both duties.
    ///
    /// On success the session has already written one `STATE` line (the
    /// initial announce) before any duty runs, so the broker learns who
    /// connected without waiting for the first broadcast tick.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Connect`] — the TCP connection could not be
    ///   established. Fails fast; never hangs past the OS connect.
    /// - [`SessionError::Announce`] — the connection opened but the
    ///   initial `STATE` write failed.
    pub async fn connect<P, H>(
        config: SessionConfig,
        provider: Arc<P>,
        handler: Arc<H>,
    ) -> Result<Self, SessionError>
    where
        P: StateProvider,
        H: MessageHandler,
    {
        let addr = config.addr();
        let stream = TcpStream::connect(&addr).await.map_err(|source| {
            SessionError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;

        let (read_half, write_half) = stream.into_split();
        let reader = FramedRead::new(
            read_half,
            LinesCodec::new_with_max_length(config.max_line_bytes),
        );
        let mut writer = FramedWrite::new(
            write_half,
            LinesCodec::new_with_max_length(config.max_line_bytes),
        );

        let ping = Arc::new(PingTracker::new());

        // Initial announce: one STATE line, before the loops start.
        let announce = stamped_state(provider.as_ref(), &ping);
        writer
            .send(codec::encode(&Message::State(announce)))
            .await
            .map_err(|error| SessionError::Announce(into_io(error)))?;

        tracing::info!(%addr, "session connected and announced");

        let (outbound, outbound_rx) = OutboundQueue::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);
        let (closed_tx, closed_rx) = watch::channel(false);

        let read_task = tokio::spawn(read_loop(
            reader,
            Arc::clone(&handler),
            outbound.clone(),
            Arc::clone(&ping),
            Arc::clone(&shutdown),
            shutdown_rx.clone(),
        ));
        let write_task = tokio::spawn(write_loop(
            writer,
            outbound_rx,
            provider,
            Arc::clone(&ping),
            config,
            Arc::clone(&shutdown),
            shutdown_rx,
        ));

        // Supervisor: wait for both duties, then report closure once.
        tokio::spawn(async move {
            let _ = tokio::join!(read_task, write_task);
            let _ = closed_tx.send(true);
            handler.on_closed();
            tracing::info!("session closed");
        });

        Ok(Self {
            outbound,
            ping,
            shutdown,
            closed: closed_rx,
        })
    }

    /// A producer handle for the outbound queue.
    pub fn queue(&self) -> OutboundQueue {
        self.outbound.clone()
    }

    /// Appends a message to the outbound queue. Thread-safe, never
    /// blocks; callable from any task.
    pub fn enqueue(&self, message: Message) {
        self.outbound.push(message);
    }

    /// Requests cooperative cancellation of both duties. Idempotent;
    /// returns immediately. Use [`closed`](Self::closed) to await full
    /// teardown.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether the session has fully closed (both duties stopped).
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Waits until the session has fully closed.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        while !*closed.borrow_and_update() {
            if closed.changed().await.is_err() {
                break;
            }
        }
    }

    /// The latest measured ping round trip, if any probe has completed.
    pub fn latency_ms(&self) -> Option<u32> {
        self.ping.latency_ms()
    }
}

impl Drop for TcpSession {
    fn drop(&mut self) {
        // A dropped session must not leave duties running on a socket
        // nobody owns anymore.
        let _ = self.shutdown.send(true);
    }
}

// ---------------------------------------------------------------------------
// Inbound duty
// ---------------------------------------------------------------------------

async fn read_loop<H: MessageHandler>(
    mut reader: LineReader,
    handler: Arc<H>,
    outbound: OutboundQueue,
    ping: Arc<PingTracker>,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            item = reader.next() => match item {
                Some(Ok(line)) => {
                    dispatch_line(&line, handler.as_ref(), &outbound, &ping);
                }
                Some(Err(error)) => {
                    // Reported once, here — not per subsequent line.
                    tracing::warn!(error = %into_io(error), "read fault, closing session");
                    break;
                }
                None => {
                    tracing::info!("peer closed the connection");
                    break;
                }
            },
        }
    }
    // Stop the outbound duty too.
    let _ = shutdown.send(true);
}

/// Decodes one line and routes it.
///
/// Ping traffic is short-circuited here: `PINGREQ` is answered by
/// enqueuing the echo (liveness must not depend on application
/// scheduling) and `PINGRSP` closes the matching round trip. Everything
/// else goes to the handler. A malformed line is dropped with a warning —
/// framing is per-line, so the next line is unaffected.
fn dispatch_line<H: MessageHandler>(
    line: &str,
    handler: &H,
    outbound: &OutboundQueue,
    ping: &PingTracker,
) {
    match codec::decode(line) {
        Ok(Message::PingRequest { id }) => {
            outbound.push(Message::PingResponse { id });
        }
        Ok(Message::PingResponse { id }) => {
            match ping.complete(id) {
                Some(rtt_ms) => tracing::trace!(rtt_ms, "ping round trip"),
                None => tracing::debug!(id, "unmatched ping response ignored"),
            }
        }
        Ok(message) => handler.on_message(message, outbound),
        Err(error) => {
            tracing::warn!(%error, line, "dropping malformed line");
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound duty
// ---------------------------------------------------------------------------

async fn write_loop<P: StateProvider>(
    mut writer: LineWriter,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    provider: Arc<P>,
    ping: Arc<PingTracker>,
    config: SessionConfig,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // The announce already went out in connect(); start both timers one
    // full period from now rather than firing immediately.
    let now = Instant::now();
    let mut broadcast =
        time::interval_at(now + config.broadcast_interval, config.broadcast_interval);
    let mut ping_timer =
        time::interval_at(now + config.ping_interval, config.ping_interval);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            maybe = outbound_rx.recv() => {
                let Some(first) = maybe else { break };
                // Drain everything already queued behind it: a batch
                // enqueued back-to-back is written back-to-back, never
                // split by a broadcast tick.
                let mut batch = vec![first];
                while let Ok(next) = outbound_rx.try_recv() {
                    batch.push(next);
                }
                if !send_all(&mut writer, &batch).await {
                    break;
                }
            }
            _ = broadcast.tick() => {
                let state = stamped_state(provider.as_ref(), &ping);
                if !send_line(&mut writer, &Message::State(state)).await {
                    break;
                }
            }
            _ = ping_timer.tick() => {
                let id = ping.begin();
                if !send_line(&mut writer, &Message::PingRequest { id }).await {
                    break;
                }
            }
        }
    }
    // Stop the inbound duty too.
    let _ = shutdown.send(true);
}

async fn send_all(writer: &mut LineWriter, batch: &[Message]) -> bool {
    for message in batch {
        if !send_line(writer, message).await {
            return false;
        }
    }
    true
}

/// Writes one message as one line. Returns `false` on a write fault,
/// which the write loop treats as fatal to the session. No retry at this
/// layer — recovery is the caller's explicit reconnect.
async fn send_line(writer: &mut LineWriter, message: &Message) -> bool {
    match writer.send(codec::encode(message)).await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(
                error = %into_io(error),
                tag = message.tag(),
                "write fault, closing session"
            );
            false
        }
    }
}

/// Pulls a fresh snapshot and stamps the session's measured round trip
/// into it — the session is the only component that observes the ping,
/// so the provider's `ping_ms` is always overwritten.
fn stamped_state<P: StateProvider>(
    provider: &P,
    ping: &PingTracker,
) -> gridlink_protocol::LocalState {
    let mut state = provider.local_state();
    state.ping_ms = ping.latency_ms().unwrap_or(0);
    state
}

fn into_io(error: LinesCodecError) -> std::io::Error {
    match error {
        LinesCodecError::Io(io) => io,
        LinesCodecError::MaxLineLengthExceeded => std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "line exceeds maximum length",
        ),
    }
}
