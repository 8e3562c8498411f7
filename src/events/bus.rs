//! # Event bus for session events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: the supervisor, the epoch and both
//! stream workers publish into it without blocking; the supervisor's listener
//! forwards everything to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Supervisor ──┐
//! Epoch      ──┼──► Bus ──► subscriber listener ──► SubscriberSet ──► LogWriter, ...
//! Workers    ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One shared ring buffer; receivers that fall behind see `RecvError::Lagged(n)`.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for session events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_later_events_only() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Dialing));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::Connected));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::Connected);
    }
}
