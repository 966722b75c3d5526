//! # Dispatcher: explicit-registration fan-out with isolated failures.
//!
//! The [`Dispatcher`] owns its handlers (strong references) until they are
//! explicitly unregistered. It keeps two lists per message type, one for
//! synchronous and one for asynchronous handlers, behind a single lock.
//!
//! ## Dispatch algorithm
//! ```text
//! send(msg) / send_async(msg)
//!   ├─► lock ─► copy sync list + async list ─► unlock
//!   ├─► sync handlers, inline, registration order
//!   │       └─ Err / panic ─► report (tracing + failure bus), continue
//!   ├─► async handlers, one spawned task each (fire-and-forget)
//!   │       └─ inside the task: Err / panic ─► report
//!   └─► send:        return
//!       send_async:  join every task started by this call, then return
//! ```
//!
//! ## Rules
//! - No handler ever runs while the lock is held: handlers may register,
//!   unregister or send themselves.
//! - An in-flight send works on its snapshot; concurrent registration never
//!   affects it.
//! - Handler failures are **isolated**: they never reach the sender and never
//!   stop sibling handlers. Subscribe to [`Dispatcher::failures`] to observe them.
//! - No ordering between the sync and async groups, among async handlers, or
//!   between overlapping sends.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use typebus::{Dispatcher, HandlerFn, HandlerRef};
//!
//! let dispatcher = Dispatcher::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = hits.clone();
//! let on_text: HandlerRef<String> = HandlerFn::arc("count", move |_: &String| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! dispatcher.register(on_text.clone());
//! dispatcher.send("m".to_string());
//! dispatcher.send(42_u32); // nobody listens for u32
//!
//! dispatcher.unregister(&on_text);
//! dispatcher.send("m".to_string());
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::builder::DispatcherBuilder;
use super::config::DispatcherConfig;
use crate::core::panic::{catch_async, catch_sync};
use crate::events::{Event, EventKind, FailureBus};
use crate::handlers::{AsyncHandlerRef, HandlerKind, HandlerRef, Message};
use crate::registry::{AsyncHandlers, MessageKey, Registry, SyncHandlers, address_of};

/// Async handler task started by a dispatch, with the handler name for reports.
type Started = (Arc<str>, JoinHandle<()>);

/// Message bus with owned registrations and per-handler failure isolation.
///
/// Cheap to clone: clones share the same registry, so one instance can be
/// handed to every component that needs the bus.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    name: Arc<str>,
    lists: Mutex<Lists>,
    failures: FailureBus,
    runtime: Option<Handle>,
}

#[derive(Default)]
struct Lists {
    sync: Registry<SyncHandlers>,
    asynchronous: Registry<AsyncHandlers>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default configuration.
    ///
    /// Async handlers are spawned on the runtime the sender is running on.
    pub fn new() -> Self {
        Self::builder(DispatcherConfig::default()).build()
    }

    /// Returns a builder for a customized dispatcher.
    pub fn builder(cfg: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: DispatcherConfig, runtime: Option<Handle>) -> Self {
        let name: Arc<str> = Arc::from(cfg.name.as_ref());
        Self {
            inner: Arc::new(Inner {
                failures: FailureBus::new(Arc::clone(&name), cfg.bus_capacity_clamped()),
                name,
                lists: Mutex::new(Lists::default()),
                runtime,
            }),
        }
    }

    /// Name from the configuration.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Registers a synchronous handler for `M`.
    ///
    /// The dispatcher keeps `handler` alive until it is unregistered.
    /// Registering the same handler twice yields two invocations per send.
    pub fn register<M: Message>(&self, handler: HandlerRef<M>) {
        trace!(
            dispatcher = %self.inner.name,
            message_type = MessageKey::of::<M>().name(),
            handler = handler.name(),
            "register"
        );
        self.inner.lists.lock().sync.push::<M>(handler);
    }

    /// Registers an asynchronous handler for `M`.
    pub fn register_async<M: Message>(&self, handler: AsyncHandlerRef<M>) {
        trace!(
            dispatcher = %self.inner.name,
            message_type = MessageKey::of::<M>().name(),
            handler = handler.name(),
            "register_async"
        );
        self.inner.lists.lock().asynchronous.push::<M>(handler);
    }

    /// Unregisters every registration of `handler` for `M`.
    ///
    /// Identity is the shared allocation: pass a clone of the registered
    /// handle. Unknown handlers are ignored.
    pub fn unregister<M: Message>(&self, handler: &HandlerRef<M>) {
        let removed = self
            .inner
            .lists
            .lock()
            .sync
            .remove_target::<M>(address_of(handler));
        trace!(dispatcher = %self.inner.name, message_type = MessageKey::of::<M>().name(), removed, "unregister");
    }

    /// Unregisters every registration of the async `handler` for `M`.
    pub fn unregister_async<M: Message>(&self, handler: &AsyncHandlerRef<M>) {
        let removed = self
            .inner
            .lists
            .lock()
            .asynchronous
            .remove_target::<M>(address_of(handler));
        trace!(dispatcher = %self.inner.name, message_type = MessageKey::of::<M>().name(), removed, "unregister_async");
    }

    /// Delivers `message` without waiting for asynchronous handlers.
    ///
    /// Returns once every synchronous handler has run and every asynchronous
    /// handler has been started. Failures are reported, never returned.
    pub fn send<M: Message>(&self, message: M) {
        let _started = self.dispatch(message);
    }

    /// Delivers `message` and waits for every asynchronous handler it started.
    ///
    /// A failing handler does not cut the wait short for the others.
    pub async fn send_async<M: Message>(&self, message: M) {
        let started = self.dispatch(message);
        if started.is_empty() {
            return;
        }

        let (names, joins): (Vec<Arc<str>>, Vec<JoinHandle<()>>) = started.into_iter().unzip();
        let results = futures::future::join_all(joins).await;

        for (name, res) in names.into_iter().zip(results) {
            if let Err(join_err) = res {
                self.inner.report(
                    Event::new(EventKind::HandlerAborted)
                        .with_handler(name, HandlerKind::Async)
                        .with_message_type(MessageKey::of::<M>().name())
                        .with_reason(join_err.to_string()),
                );
            }
        }
    }

    /// Drops every registration, sync and async, at once.
    ///
    /// Meant for test isolation: live handlers are discarded without notice.
    pub fn reset(&self) {
        let mut lists = self.inner.lists.lock();
        lists.sync.clear();
        lists.asynchronous.clear();
        trace!(dispatcher = %self.inner.name, "reset");
    }

    /// Number of synchronous registrations for `M`.
    pub fn handler_count<M: Message>(&self) -> usize {
        self.inner.lists.lock().sync.len::<M>()
    }

    /// Number of asynchronous registrations for `M`.
    pub fn async_handler_count<M: Message>(&self) -> usize {
        self.inner.lists.lock().asynchronous.len::<M>()
    }

    /// True if `M` has at least one registration of either kind.
    pub fn is_registered<M: Message>(&self) -> bool {
        let lists = self.inner.lists.lock();
        lists.sync.contains::<M>() || lists.asynchronous.contains::<M>()
    }

    /// True if nothing is registered for any type.
    pub fn is_empty(&self) -> bool {
        let lists = self.inner.lists.lock();
        lists.sync.is_empty() && lists.asynchronous.is_empty()
    }

    /// Subscribes to failure reports of this dispatcher.
    ///
    /// Only reports published after this call are received.
    pub fn failures(&self) -> broadcast::Receiver<Event> {
        self.inner.failures.subscribe()
    }

    /// Snapshot, sync phase, async start. Returns the started tasks.
    fn dispatch<M: Message>(&self, message: M) -> Vec<Started> {
        let (sync, asynchronous) = {
            let lists = self.inner.lists.lock();
            (
                lists.sync.snapshot::<M>(),
                lists.asynchronous.snapshot::<M>(),
            )
        };
        if sync.is_empty() && asynchronous.is_empty() {
            return Vec::new();
        }

        let message = Arc::new(message);
        self.run_sync(&sync, &message);
        self.spawn_async(asynchronous, &message)
    }

    fn run_sync<M: Message>(&self, handlers: &[HandlerRef<M>], message: &M) {
        for handler in handlers {
            if let Err(err) = catch_sync(|| handler.handle(message)) {
                self.inner.report(
                    Event::handler_failure(handler.name(), HandlerKind::Sync, &err)
                        .with_message_type(MessageKey::of::<M>().name()),
                );
            }
        }
    }

    fn spawn_async<M: Message>(
        &self,
        handlers: Vec<AsyncHandlerRef<M>>,
        message: &Arc<M>,
    ) -> Vec<Started> {
        if handlers.is_empty() {
            return Vec::new();
        }

        let Some(runtime) = self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            for handler in &handlers {
                self.inner.report(
                    Event::new(EventKind::RuntimeUnavailable)
                        .with_handler(handler.name(), HandlerKind::Async)
                        .with_message_type(MessageKey::of::<M>().name())
                        .with_reason("no tokio runtime to spawn async handler on"),
                );
            }
            return Vec::new();
        };

        let mut started = Vec::with_capacity(handlers.len());
        for handler in handlers {
            let name: Arc<str> = Arc::from(handler.name());
            let inner = Arc::clone(&self.inner);
            let msg = Arc::clone(message);
            let report_name = Arc::clone(&name);

            let join = runtime.spawn(async move {
                if let Err(err) = catch_async(handler.handle(msg)).await {
                    inner.report(
                        Event::handler_failure(report_name, HandlerKind::Async, &err)
                            .with_message_type(MessageKey::of::<M>().name()),
                    );
                }
            });
            started.push((name, join));
        }
        started
    }
}

impl Inner {
    /// Logs an isolated failure and publishes it on the failure bus.
    fn report(&self, ev: Event) {
        warn!(
            dispatcher = %self.name,
            kind = ev.kind.as_label(),
            message_type = ev.message_type.unwrap_or("<unknown>"),
            handler = ev.handler.as_deref().unwrap_or("<unknown>"),
            handler_kind = ev.handler_kind.map_or("<unknown>", |k| k.as_label()),
            reason = ev.reason.as_deref().unwrap_or(""),
            "handler failure isolated"
        );
        self.failures.report(ev);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.inner.name)
            .field("pinned_runtime", &self.inner.runtime.is_some())
            .finish_non_exhaustive()
    }
}
