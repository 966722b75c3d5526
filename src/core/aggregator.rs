//! # Aggregator: per-instance bus with weak subscriptions.
//!
//! The [`Aggregator`] keeps a non-owning [`Weak`] reference to every subscribed
//! handler. Subscribing never keeps a component alive: once the subscriber drops
//! its last [`AsyncHandlerRef`], the entry is dead, is never invoked again and
//! is pruned lazily by the next `publish` or `unsubscribe` for that type.
//!
//! ## Publish algorithm
//! ```text
//! publish(msg)
//!   ├─► lock ─► snapshot(Vec<Weak>) ─► unlock          (absent type → return)
//!   ├─► for entry in snapshot (in subscription order):
//!   │       ├─ upgrade() = Some(h) ─► h.handle(msg).await   (sequential)
//!   │       │                           └─ Err / panic ─► stop iterating
//!   │       └─ upgrade() = None    ─► skip
//!   ├─► if the snapshot holds dead entries: lock ─► remove_dead() ─► drop empty key
//!   └─► return first failure (if any)
//! ```
//!
//! ## Failure contract
//! Failures are **not** isolated here: the first handler error (or panic)
//! aborts the remaining handlers of that publish call and is returned to the
//! caller. Wrap handlers yourself if you need isolation, or use the
//! [`Dispatcher`](crate::Dispatcher).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use typebus::{Aggregator, AsyncHandlerFn, AsyncHandlerRef, HandlerError};
//!
//! struct UserLoggedIn { name: String }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), HandlerError> {
//! let bus = Aggregator::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = seen.clone();
//! let handler: AsyncHandlerRef<UserLoggedIn> =
//!     AsyncHandlerFn::arc("count", move |ev: Arc<UserLoggedIn>| {
//!         let counter = counter.clone();
//!         async move {
//!             assert!(!ev.name.is_empty());
//!             counter.fetch_add(1, Ordering::SeqCst);
//!             Ok::<_, HandlerError>(())
//!         }
//!     });
//!
//! bus.subscribe(&handler);
//! bus.publish(UserLoggedIn { name: "jdoe".into() }).await?;
//!
//! drop(handler); // the subscription expires with the handler
//! bus.publish(UserLoggedIn { name: "jdoe".into() }).await?;
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::core::panic::catch_async;
use crate::error::{HandlerResult, RegistryError};
use crate::handlers::{AsyncHandler, AsyncHandlerRef, Message};
use crate::registry::{MessageKey, Registry, WeakAsyncHandlers, address_of};

/// Instance-scoped message bus with automatically expiring subscriptions.
///
/// Thread-safe; share it behind an `Arc` (or by reference) between tasks.
#[derive(Default)]
pub struct Aggregator {
    registry: Mutex<Registry<WeakAsyncHandlers>>,
}

impl Aggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to messages of type `M` without taking ownership.
    ///
    /// No uniqueness check: subscribing the same handler twice yields two
    /// invocations per publish.
    pub fn subscribe<M: Message>(&self, handler: &AsyncHandlerRef<M>) {
        self.registry.lock().push::<M>(Arc::downgrade(handler));
        trace!(
            message_type = MessageKey::of::<M>().name(),
            handler = handler.name(),
            "subscribed"
        );
    }

    /// Subscribes an already weak handler reference.
    ///
    /// # Errors
    /// [`RegistryError::InvalidArgument`] if `handler` no longer points at a
    /// live handler; nothing is registered in that case.
    pub fn subscribe_weak<M: Message>(
        &self,
        handler: &Weak<dyn AsyncHandler<M>>,
    ) -> Result<(), RegistryError> {
        if handler.strong_count() == 0 {
            return Err(RegistryError::InvalidArgument {
                reason: "handler has already been dropped",
            });
        }
        self.registry.lock().push::<M>(handler.clone());
        Ok(())
    }

    /// Removes every subscription of `handler` for `M`.
    ///
    /// Dead entries of the same type are pruned on the way; unknown handlers
    /// are ignored.
    pub fn unsubscribe<M: Message>(&self, handler: &AsyncHandlerRef<M>) {
        let removed = self
            .registry
            .lock()
            .remove_target::<M>(address_of(handler));
        trace!(
            message_type = MessageKey::of::<M>().name(),
            removed,
            "unsubscribed"
        );
    }

    /// Delivers `message` to every live subscriber of `M`, one after another.
    ///
    /// Each handler is awaited before the next one starts, in subscription
    /// order. Dead entries of `M` are removed before returning, whether or not
    /// a handler failed.
    ///
    /// # Errors
    /// The first [`HandlerError`](crate::HandlerError) (returned or caught
    /// panic); handlers after the failing one are not invoked.
    pub async fn publish<M: Message>(&self, message: M) -> HandlerResult {
        let snapshot = self.registry.lock().snapshot::<M>();
        if snapshot.is_empty() {
            return Ok(());
        }

        let message = Arc::new(message);
        let mut outcome = Ok(());

        for entry in &snapshot {
            let Some(handler) = entry.upgrade() else {
                continue;
            };

            if let Err(err) = catch_async(handler.handle(Arc::clone(&message))).await {
                debug!(
                    message_type = MessageKey::of::<M>().name(),
                    handler = handler.name(),
                    error = %err,
                    "publish aborted by handler failure"
                );
                outcome = Err(err);
                break;
            }
        }

        // Entries past an aborting handler count too.
        if snapshot.iter().any(|entry| entry.strong_count() == 0) {
            self.prune::<M>();
        }
        outcome
    }

    /// Number of entries for `M`, including dead ones not yet pruned.
    pub fn entry_count<M: Message>(&self) -> usize {
        self.registry.lock().len::<M>()
    }

    /// True if the registry currently holds a list for `M`.
    pub fn is_subscribed<M: Message>(&self) -> bool {
        self.registry.lock().contains::<M>()
    }

    /// Names of the message types that currently have entries.
    pub fn message_types(&self) -> Vec<&'static str> {
        let registry = self.registry.lock();
        let mut names: Vec<&'static str> = registry.keys().map(MessageKey::name).collect();
        names.sort_unstable();
        names
    }

    fn prune<M: Message>(&self) {
        let removed = self.registry.lock().remove_dead::<M>();
        if removed > 0 {
            debug!(
                message_type = MessageKey::of::<M>().name(),
                removed, "pruned dead subscriptions"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::AsyncHandlerFn;

    #[derive(Debug, Clone)]
    struct UserLoggedIn {
        name: String,
    }

    fn login(name: &str) -> UserLoggedIn {
        UserLoggedIn { name: name.into() }
    }

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        prefix: &'static str,
    ) -> AsyncHandlerRef<UserLoggedIn> {
        let log = log.clone();
        AsyncHandlerFn::arc(prefix, move |ev: Arc<UserLoggedIn>| {
            let log = log.clone();
            async move {
                log.lock().push(format!("{prefix}: {}", ev.name));
                Ok::<_, HandlerError>(())
            }
        })
    }

    fn counting(hits: &Arc<AtomicUsize>) -> AsyncHandlerRef<UserLoggedIn> {
        let hits = hits.clone();
        AsyncHandlerFn::arc("count", move |_: Arc<UserLoggedIn>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        })
    }

    #[tokio::test]
    async fn test_publish_invokes_subscribed_handler() {
        let agg = Aggregator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder(&log, "h");
        agg.subscribe(&h);

        agg.publish(login("JohnDoe")).await.unwrap();

        assert_eq!(*log.lock(), ["h: JohnDoe"]);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let agg = Aggregator::new();
        assert!(agg.publish(login("nobody")).await.is_ok());
        assert!(!agg.is_subscribed::<UserLoggedIn>());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_and_drops_key() {
        let agg = Aggregator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder(&log, "h");

        agg.subscribe(&h);
        agg.unsubscribe(&h);
        agg.publish(login("JohnDoe")).await.unwrap();

        assert!(log.lock().is_empty());
        assert!(!agg.is_subscribed::<UserLoggedIn>());
    }

    #[tokio::test]
    async fn test_unsubscribe_leaves_other_subscribers() {
        let agg = Aggregator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let to_remove = recorder(&log, "ToRemove");
        let remaining = recorder(&log, "Remaining");

        agg.subscribe(&to_remove);
        agg.subscribe(&remaining);
        agg.unsubscribe(&to_remove);
        agg.publish(login("JohnDoe")).await.unwrap();

        assert_eq!(*log.lock(), ["Remaining: JohnDoe"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_handler_is_noop() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let subscribed = counting(&hits);
        let stranger = counting(&hits);

        agg.unsubscribe(&stranger);
        agg.subscribe(&subscribed);
        agg.unsubscribe(&stranger);
        agg.publish(login("x")).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_run_in_order() {
        let agg = Aggregator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let slow: AsyncHandlerRef<UserLoggedIn> = {
            let log = log.clone();
            AsyncHandlerFn::arc("slow", move |ev: Arc<UserLoggedIn>| {
                let log = log.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    log.lock().push(format!("Handler1: {}", ev.name));
                    Ok::<_, HandlerError>(())
                }
            })
        };
        let fast = recorder(&log, "Handler2");

        agg.subscribe(&slow);
        agg.subscribe(&fast);
        agg.publish(login("JohnDoe")).await.unwrap();

        assert_eq!(*log.lock(), ["Handler1: JohnDoe", "Handler2: JohnDoe"]);
    }

    #[tokio::test]
    async fn test_duplicate_subscription_invokes_twice() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = counting(&hits);

        agg.subscribe(&h);
        agg.subscribe(&h);
        agg.publish(login("x")).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        agg.unsubscribe(&h);
        agg.publish(login("x")).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_handlers() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let failing: AsyncHandlerRef<UserLoggedIn> =
            AsyncHandlerFn::arc("failing", |_: Arc<UserLoggedIn>| async {
                Err::<(), _>(HandlerError::fail("rejected"))
            });
        let after = counting(&hits);

        agg.subscribe(&failing);
        agg.subscribe(&after);

        let res = agg.publish(login("x")).await;
        assert_eq!(res, Err(HandlerError::fail("rejected")));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dead_entries_pruned_even_when_publish_aborts() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let gone_before = counting(&hits);
        let failing: AsyncHandlerRef<UserLoggedIn> =
            AsyncHandlerFn::arc("failing", |_: Arc<UserLoggedIn>| async {
                Err::<(), _>(HandlerError::fail("rejected"))
            });
        let gone_after = counting(&hits);

        agg.subscribe(&gone_before);
        agg.subscribe(&failing);
        agg.subscribe(&gone_after);
        drop(gone_before);
        drop(gone_after);
        assert_eq!(agg.entry_count::<UserLoggedIn>(), 3);

        let res = agg.publish(login("x")).await;

        assert!(res.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(agg.entry_count::<UserLoggedIn>(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_returned_as_failure() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let before = counting(&hits);
        let panicking: AsyncHandlerRef<UserLoggedIn> =
            AsyncHandlerFn::arc("panicking", |ev: Arc<UserLoggedIn>| async move {
                if ev.name.is_empty() {
                    panic!("empty user name");
                }
                Ok::<_, HandlerError>(())
            });

        agg.subscribe(&before);
        agg.subscribe(&panicking);

        let err = agg.publish(login("")).await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_skipped_and_pruned() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let kept = counting(&hits);
        let dropped = counting(&hits);

        agg.subscribe(&kept);
        agg.subscribe(&dropped);
        drop(dropped);

        assert_eq!(agg.entry_count::<UserLoggedIn>(), 2);
        agg.publish(login("x")).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(agg.entry_count::<UserLoggedIn>(), 1);
    }

    #[tokio::test]
    async fn test_last_dropped_subscriber_removes_key() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = counting(&hits);

        agg.subscribe(&h);
        drop(h);
        assert!(agg.is_subscribed::<UserLoggedIn>());

        agg.publish(login("x")).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!agg.is_subscribed::<UserLoggedIn>());
        assert!(agg.message_types().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_prunes_dead_entries() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let a = counting(&hits);
        let b = counting(&hits);

        agg.subscribe(&a);
        agg.subscribe(&b);
        drop(b);
        agg.unsubscribe(&a);

        assert!(!agg.is_subscribed::<UserLoggedIn>());
    }

    #[tokio::test]
    async fn test_subscribe_weak_rejects_dead_reference() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = counting(&hits);
        let weak = Arc::downgrade(&h);

        assert!(agg.subscribe_weak(&weak).is_ok());
        drop(h);

        let err = agg.subscribe_weak(&weak).unwrap_err();
        assert_eq!(err.as_label(), "registry_invalid_argument");
        assert_eq!(agg.entry_count::<UserLoggedIn>(), 1);
    }

    #[tokio::test]
    async fn test_types_are_routed_separately() {
        let agg = Aggregator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let on_login = counting(&hits);
        let on_number: AsyncHandlerRef<u64> =
            AsyncHandlerFn::arc("number", |_: Arc<u64>| async { Ok::<_, HandlerError>(()) });

        agg.subscribe(&on_login);
        agg.subscribe(&on_number);
        agg.publish(7_u64).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(agg.message_types().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publish_delivers_every_message() {
        let agg = Arc::new(Aggregator::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder(&log, "h");
        agg.subscribe(&h);

        let publishes = (0..100).map(|i| {
            let agg = agg.clone();
            tokio::spawn(async move { agg.publish(login(&format!("User{i}"))).await })
        });
        for res in futures::future::join_all(publishes).await {
            res.unwrap().unwrap();
        }

        assert_eq!(log.lock().len(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_publish_and_drop() {
        let agg = Arc::new(Aggregator::new());
        let stable_hits = Arc::new(AtomicUsize::new(0));
        let stable = counting(&stable_hits);
        agg.subscribe(&stable);

        let churn = (0..8).map(|_| {
            let agg = agg.clone();
            tokio::spawn(async move {
                let hits = Arc::new(AtomicUsize::new(0));
                for _ in 0..50 {
                    let h = counting(&hits);
                    agg.subscribe(&h);
                    tokio::task::yield_now().await;
                    if hits.load(Ordering::SeqCst) % 2 == 0 {
                        agg.unsubscribe(&h);
                    }
                    drop(h);
                }
            })
        });
        let publishers = (0..8).map(|_| {
            let agg = agg.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    agg.publish(login("x")).await.unwrap();
                }
            })
        });

        let churn: Vec<_> = churn.collect();
        let publishers: Vec<_> = publishers.collect();
        for h in churn.into_iter().chain(publishers) {
            h.await.unwrap();
        }

        assert_eq!(stable_hits.load(Ordering::SeqCst), 8 * 25);

        agg.publish(login("final")).await.unwrap();
        assert_eq!(agg.entry_count::<UserLoggedIn>(), 1);
    }
}
