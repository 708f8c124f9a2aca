//! Session event stream
//!
//! All session activity (arbitration notifications, non-fatal protocol
//! faults, session end) is emitted through subscriber channels. Delivery is
//! synchronous with respect to the run-loop iteration that produced the
//! event: a slow subscriber delays subsequent frame processing, which is an
//! accepted trade-off given the low update rate of the physical source.

use tokio::sync::mpsc;

use crate::channels::ChannelId;

/// Classification of a non-fatal per-line protocol fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The line did not parse as `<channel>:<value>`
    MalformedUpdate,
    /// The line parsed but named a channel outside the registered set
    UnknownChannel,
}

/// Events emitted by a running link session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The arbitration winner changed to a new channel
    ///
    /// Never fired for a transition to the all-zero state; that surfaces as
    /// `ValueChanged { value: 0 }` only.
    WinnerChanged {
        /// The new winner
        channel: ChannelId,
    },

    /// The effective value (the winner's value) changed
    ValueChanged {
        /// The new effective value
        value: i64,
    },

    /// A single update line was rejected; the session keeps running
    ProtocolFault {
        /// What was wrong with the line
        kind: FaultKind,
        /// The raw offending line
        line: String,
    },

    /// The run loop ended
    ///
    /// `error` is `None` for clean shutdown (cancellation is not an error)
    /// and carries the transport failure detail otherwise.
    SessionEnded {
        /// Failure detail, if the loop died rather than being cancelled
        error: Option<String>,
    },
}

/// Fans session events out to registered subscribers in generation order
pub struct EventDispatcher {
    listeners: Vec<mpsc::Sender<LinkEvent>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no subscribers
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a subscriber and return its receiving end
    pub fn subscribe(&mut self, capacity: usize) -> mpsc::Receiver<LinkEvent> {
        let (tx, rx) = mpsc::channel(capacity);
        self.listeners.push(tx);
        rx
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver one event to every subscriber, in registration order
    ///
    /// Dropped subscribers are skipped silently.
    pub async fn emit(&self, event: LinkEvent) {
        for listener in &self.listeners {
            let _ = listener.send(event.clone()).await;
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventDispatcher, LinkEvent};
    use crate::channels::ChannelId;

    #[tokio::test]
    async fn test_emit_reaches_all_subscribers() {
        let mut dispatcher = EventDispatcher::new();
        let mut rx_a = dispatcher.subscribe(8);
        let mut rx_b = dispatcher.subscribe(8);

        dispatcher
            .emit(LinkEvent::WinnerChanged {
                channel: ChannelId(3),
            })
            .await;

        assert_eq!(
            rx_a.recv().await,
            Some(LinkEvent::WinnerChanged {
                channel: ChannelId(3)
            })
        );
        assert_eq!(
            rx_b.recv().await,
            Some(LinkEvent::WinnerChanged {
                channel: ChannelId(3)
            })
        );
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_block_emit() {
        let mut dispatcher = EventDispatcher::new();
        let rx = dispatcher.subscribe(1);
        let mut rx_live = dispatcher.subscribe(1);
        drop(rx);

        dispatcher.emit(LinkEvent::ValueChanged { value: 9 }).await;

        assert_eq!(
            rx_live.recv().await,
            Some(LinkEvent::ValueChanged { value: 9 })
        );
    }

    #[tokio::test]
    async fn test_order_preserved_per_subscriber() {
        let mut dispatcher = EventDispatcher::new();
        let mut rx = dispatcher.subscribe(8);

        dispatcher
            .emit(LinkEvent::WinnerChanged {
                channel: ChannelId(1),
            })
            .await;
        dispatcher.emit(LinkEvent::ValueChanged { value: 40 }).await;

        assert!(matches!(
            rx.recv().await,
            Some(LinkEvent::WinnerChanged { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(LinkEvent::ValueChanged { value: 40 })
        ));
    }
}
