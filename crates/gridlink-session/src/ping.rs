//! Ping round-trip tracking.
//!
//! The session sends `PINGREQ|<id>` probes on a fixed cadence and the
//! broker echoes the id back in `PINGRSP|<id>`. This module correlates
//! the two and keeps the latest measured round-trip time.
//!
//! A probe that never comes back is simply superseded by the next one —
//! the session does not disconnect on missed pings. Staleness shows up
//! as `latency_ms` stopping to update, which is the caller's signal.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use rand::Rng;

/// Sentinel for "no round trip measured yet".
const NO_LATENCY: u32 = u32::MAX;

/// Correlates outgoing ping probes with their echoed responses.
///
/// Lock-free: one probe in flight at a time, tracked as an atomic id plus
/// the send time in milliseconds relative to the tracker's creation.
/// Shared between the write loop (which begins probes), the read loop
/// (which completes them), and the session handle (which reads latency).
#[derive(Debug)]
pub struct PingTracker {
    /// Fixed reference point for the relative millisecond timestamps.
    started: Instant,
    /// Id of the probe currently in flight; 0 means none.
    inflight_id: AtomicU64,
    /// When the in-flight probe was sent, in ms since `started`.
    inflight_at_ms: AtomicU64,
    /// Latest measured round trip, or [`NO_LATENCY`].
    latest_ms: AtomicU32,
}

impl PingTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            inflight_id: AtomicU64::new(0),
            inflight_at_ms: AtomicU64::new(0),
            latest_ms: AtomicU32::new(NO_LATENCY),
        }
    }

    /// Starts a new round trip and returns the id to send.
    ///
    /// Any previous unanswered probe is superseded — its response, if it
    /// ever arrives, no longer matches and is ignored.
    pub fn begin(&self) -> u64 {
        let mut rng = rand::rng();
        // 0 is the "nothing in flight" sentinel, so never hand it out.
        let id = loop {
            let candidate: u64 = rng.random();
            if candidate != 0 {
                break candidate;
            }
        };
        let now_ms = self.started.elapsed().as_millis() as u64;
        self.inflight_at_ms.store(now_ms, Ordering::Relaxed);
        self.inflight_id.store(id, Ordering::Release);
        id
    }

    /// Completes a round trip if `id` matches the probe in flight.
    ///
    /// Returns the measured latency in milliseconds, or `None` when the
    /// id is stale or unknown (a superseded probe, or a peer inventing
    /// responses — either way, ignored).
    pub fn complete(&self, id: u64) -> Option<u32> {
        if id == 0 {
            return None;
        }
        if self
            .inflight_id
            .compare_exchange(id, 0, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }
        let sent_at = self.inflight_at_ms.load(Ordering::Relaxed);
        let now_ms = self.started.elapsed().as_millis() as u64;
        let rtt = now_ms.saturating_sub(sent_at).min(u64::from(u32::MAX - 1)) as u32;
        self.latest_ms.store(rtt, Ordering::Relaxed);
        Some(rtt)
    }

    /// The latest measured round trip, if any probe has completed yet.
    pub fn latency_ms(&self) -> Option<u32> {
        let value = self.latest_ms.load(Ordering::Relaxed);
        (value != NO_LATENCY).then_some(value)
    }
}

impl Default for PingTracker {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_is_none_before_any_round_trip() {
        let tracker = PingTracker::new();
        assert_eq!(tracker.latency_ms(), None);
    }

    #[test]
    fn test_begin_then_complete_measures_latency() {
        let tracker = PingTracker::new();
        let id = tracker.begin();

        let rtt = tracker.complete(id);

        assert!(rtt.is_some());
        assert_eq!(tracker.latency_ms(), rtt);
    }

    #[test]
    fn test_complete_with_wrong_id_is_ignored() {
        let tracker = PingTracker::new();
        let id = tracker.begin();

        assert_eq!(tracker.complete(id.wrapping_add(1)), None);
        assert_eq!(tracker.latency_ms(), None);
        // The original probe is still in flight and can complete.
        assert!(tracker.complete(id).is_some());
    }

    #[test]
    fn test_complete_twice_only_counts_once() {
        let tracker = PingTracker::new();
        let id = tracker.begin();

        assert!(tracker.complete(id).is_some());
        assert_eq!(tracker.complete(id), None);
    }

    #[test]
    fn test_new_probe_supersedes_unanswered_one() {
        let tracker = PingTracker::new();
        let stale = tracker.begin();
        let fresh = tracker.begin();

        // The stale echo no longer matches.
        assert_eq!(tracker.complete(stale), None);
        assert!(tracker.complete(fresh).is_some());
    }

    #[test]
    fn test_complete_zero_id_is_ignored() {
        // 0 is the internal sentinel; a peer echoing it must not be able
        // to fake a completed round trip.
        let tracker = PingTracker::new();
        tracker.begin();
        assert_eq!(tracker.complete(0), None);
    }
}
