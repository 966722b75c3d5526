//! # Failure reports emitted by the dispatcher.
//!
//! The [`EventKind`] enum classifies what went wrong while dispatching a
//! message; the [`Event`] struct carries the metadata: timestamps, the message
//! type, the handler name and kind, and the failure reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use typebus::{Event, EventKind, HandlerKind};
//!
//! let ev = Event::new(EventKind::HandlerFailed)
//!     .with_handler("audit", HandlerKind::Sync)
//!     .with_message_type("app::UserLoggedIn")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::HandlerFailed);
//! assert_eq!(ev.handler.as_deref(), Some("audit"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::error::HandlerError;
use crate::handlers::HandlerKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Handler returned an error.
    ///
    /// Sets:
    /// - `handler`, `handler_kind`: failing handler
    /// - `message_type`: type being dispatched
    /// - `reason`: error message
    HandlerFailed,

    /// Handler panicked; the panic was caught.
    ///
    /// Sets:
    /// - `handler`, `handler_kind`: failing handler
    /// - `message_type`: type being dispatched
    /// - `reason`: panic payload
    HandlerPanicked,

    /// An async handler could not be started: no tokio runtime was configured
    /// or running on the sending thread.
    ///
    /// Sets:
    /// - `handler`, `handler_kind`: skipped handler
    /// - `message_type`: type being dispatched
    RuntimeUnavailable,

    /// A spawned async handler task was aborted before completion
    /// (runtime shutdown).
    ///
    /// Sets:
    /// - `handler`, `handler_kind`: affected handler
    /// - `message_type`: type being dispatched
    /// - `reason`: join error
    HandlerAborted,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::HandlerFailed => "handler_failed",
            EventKind::HandlerPanicked => "handler_panicked",
            EventKind::RuntimeUnavailable => "runtime_unavailable",
            EventKind::HandlerAborted => "handler_aborted",
        }
    }
}

/// Dispatch failure report with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the dispatcher that produced the report.
    pub dispatcher: Option<Arc<str>>,
    /// Fully qualified message type name.
    pub message_type: Option<&'static str>,
    /// Handler name, if applicable.
    pub handler: Option<Arc<str>>,
    /// Sync or async path.
    pub handler_kind: Option<HandlerKind>,
    /// Human-readable reason (error text, panic payload, ...).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            dispatcher: None,
            message_type: None,
            handler: None,
            handler_kind: None,
            reason: None,
        }
    }

    /// Builds the report for a failed handler invocation.
    ///
    /// The kind is [`EventKind::HandlerPanicked`] for caught panics and
    /// [`EventKind::HandlerFailed`] otherwise.
    pub fn handler_failure(
        handler: impl Into<Arc<str>>,
        kind: HandlerKind,
        err: &HandlerError,
    ) -> Self {
        let ev_kind = if err.is_panic() {
            EventKind::HandlerPanicked
        } else {
            EventKind::HandlerFailed
        };
        Event::new(ev_kind)
            .with_handler(handler, kind)
            .with_reason(err.as_message())
    }

    /// Attaches the dispatcher name.
    #[inline]
    pub fn with_dispatcher(mut self, name: impl Into<Arc<str>>) -> Self {
        self.dispatcher = Some(name.into());
        self
    }

    /// Attaches the message type name.
    #[inline]
    pub fn with_message_type(mut self, name: &'static str) -> Self {
        self.message_type = Some(name);
        self
    }

    /// Attaches the handler name and kind.
    #[inline]
    pub fn with_handler(mut self, name: impl Into<Arc<str>>, kind: HandlerKind) -> Self {
        self.handler = Some(name.into());
        self.handler_kind = Some(kind);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True if the report comes from a caught panic.
    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, EventKind::HandlerPanicked)
    }
}
