//! # Failure report channel.
//!
//! [`FailureBus`] carries the handler failures a dispatcher isolates. Every
//! report is stamped with the name of the dispatcher that owns the channel, so
//! receivers fed by several dispatchers can tell them apart.
//!
//! ## Architecture
//! ```text
//! Reporters (many):                              Receivers (any):
//!   send() sync loop ───────┐
//!   spawned async handler ──┼──► FailureBus ──► Dispatcher::failures() ──► user code
//!   send_async join ────────┘   (stamps source, broadcast ring)
//! ```
//!
//! ## Rules
//! - `report()` never blocks and works from plain threads (no runtime needed).
//! - Reports made while nobody listens are dropped.
//! - Receivers lagging more than the capacity get `RecvError::Lagged(n)`.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel of failure reports for one dispatcher.
#[derive(Debug)]
pub struct FailureBus {
    tx: broadcast::Sender<Event>,
    source: Arc<str>,
}

impl FailureBus {
    /// Creates the channel for the dispatcher named `source`.
    ///
    /// `capacity` is clamped to a minimum of 1.
    pub fn new(source: Arc<str>, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx, source }
    }

    /// Stamps `ev` with the source name and hands it to every receiver.
    ///
    /// Returns the number of receivers reached (0 when nobody listens).
    pub fn report(&self, ev: Event) -> usize {
        self.tx
            .send(ev.with_dispatcher(Arc::clone(&self.source)))
            .unwrap_or(0)
    }

    /// New receiver; sees only reports made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn test_report_without_receivers_is_dropped() {
        let bus = FailureBus::new(Arc::from("orders"), 0);
        assert_eq!(bus.report(Event::new(EventKind::HandlerFailed)), 0);

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reports_are_stamped_with_source() {
        let bus = FailureBus::new(Arc::from("orders"), 4);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.report(Event::new(EventKind::HandlerPanicked)), 2);

        for rx in [&mut a, &mut b] {
            let ev = rx.try_recv().unwrap();
            assert_eq!(ev.kind, EventKind::HandlerPanicked);
            assert_eq!(ev.dispatcher.as_deref(), Some("orders"));
        }
    }
}
