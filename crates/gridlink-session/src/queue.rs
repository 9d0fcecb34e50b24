//! The outbound message queue.

use gridlink_protocol::Message;
use tokio::sync::mpsc;

/// Producer handle for the session's outbound queue.
///
/// Multiple-producer, single-consumer: any duty or caller may push, only
/// the outbound write loop drains. `push` never blocks and never fails —
/// after the session closes, pushed messages are silently dropped (there
/// is no socket left to write them to).
///
/// Cheap to clone; every clone feeds the same queue.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: mpsc::UnboundedSender<Message>,
}

impl OutboundQueue {
    /// Creates the queue, returning the producer handle and the receiver
    /// end for the write loop.
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Appends a message to the queue. Thread-safe, non-blocking.
    pub fn push(&self, message: Message) {
        if let Err(error) = self.tx.send(message) {
            tracing::debug!(
                tag = error.0.tag(),
                "session closed; dropping outbound message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_fifo_order() {
        let (queue, mut rx) = OutboundQueue::new();
        queue.push(Message::PingRequest { id: 1 });
        queue.push(Message::PingRequest { id: 2 });
        queue.push(Message::PingRequest { id: 3 });

        for expected in 1..=3 {
            assert_eq!(
                rx.try_recv().unwrap(),
                Message::PingRequest { id: expected }
            );
        }
    }

    #[test]
    fn test_push_after_receiver_dropped_is_silent() {
        let (queue, rx) = OutboundQueue::new();
        drop(rx);
        // Must not panic or block.
        queue.push(Message::PingRequest { id: 1 });
    }

    #[test]
    fn test_clones_feed_the_same_queue() {
        let (queue, mut rx) = OutboundQueue::new();
        let clone = queue.clone();
        queue.push(Message::PingRequest { id: 1 });
        clone.push(Message::PingRequest { id: 2 });

        assert_eq!(rx.try_recv().unwrap(), Message::PingRequest { id: 1 });
        assert_eq!(rx.try_recv().unwrap(), Message::PingRequest { id: 2 });
    }
}
