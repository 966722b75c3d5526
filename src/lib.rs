//! # typebus
//!
//! **typebus** is an in-process, type-keyed publish/subscribe library for Rust.
//!
//! It routes typed messages to zero or more handlers under concurrent access,
//! mixing synchronous and asynchronous handlers. Two buses share the same
//! registry model but differ in lifetime and failure policy:
//!
//! | Bus            | Holds handlers | Handlers              | Failures                                 |
//! |----------------|----------------|-----------------------|------------------------------------------|
//! | [`Aggregator`] | weakly         | async, awaited in turn| first failure aborts and is returned     |
//! | [`Dispatcher`] | strongly       | sync inline + async   | isolated per handler, logged + reported  |
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   subscribe / register / unregister          publish / send / send_async
//!                 │                                        │
//!                 ▼                                        ▼
//! ┌───────────────────────────────────┐    lock ─► snapshot ─► unlock
//! │ Registry (behind one Mutex)       │◄───────────────────────┤
//! │   MessageKey(TypeId) ─► Vec<entry>│                        │
//! │   empty list ─► key removed       │                        ▼
//! └───────────────────────────────────┘          invoke handlers outside the lock
//!                                                ┌───────────┴────────────┐
//!                                                ▼                        ▼
//!                                   Aggregator::publish          Dispatcher::send{,_async}
//!                                   (Weak entries)               (Arc entries)
//!                                   ├─ dead ─► skip, prune       ├─ sync: inline, in order,
//!                                   └─ live ─► await in order    │   failure ─► report
//!                                      failure ─► return Err     └─ async: tokio::spawn each,
//!                                                                    failure ─► report,
//!                                                                    send_async joins them
//!
//! report = tracing::warn! + Event on the FailureBus (Dispatcher::failures()).
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Handlers**      | Sync and async handler contracts, closure-backed helpers.        | [`Handler`], [`AsyncHandler`], [`HandlerFn`], [`AsyncHandlerFn`] |
//! | **Aggregator**    | Weak subscriptions that expire with their owner.                 | [`Aggregator`]                              |
//! | **Dispatcher**    | Owned registrations, fire-and-forget or awaited async fan-out.   | [`Dispatcher`], [`DispatcherBuilder`]       |
//! | **Errors**        | Typed registration and handler errors.                           | [`RegistryError`], [`HandlerError`]         |
//! | **Failure reports**| Isolated failures as structured events.                         | [`Event`], [`EventKind`]                    |
//! | **Configuration** | Dispatcher name and failure bus capacity.                        | [`DispatcherConfig`]                        |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use typebus::{AsyncHandlerFn, AsyncHandlerRef, Dispatcher, HandlerError, HandlerFn, HandlerRef};
//!
//! #[derive(Debug)]
//! struct Saved { path: String }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = Dispatcher::new();
//!
//!     let status_bar: HandlerRef<Saved> = HandlerFn::arc("status-bar", |ev: &Saved| {
//!         println!("saved {}", ev.path);
//!         Ok(())
//!     });
//!     let backup: AsyncHandlerRef<Saved> = AsyncHandlerFn::arc("backup", |ev: Arc<Saved>| async move {
//!         if ev.path.is_empty() {
//!             return Err(HandlerError::fail("nothing to back up"));
//!         }
//!         Ok(())
//!     });
//!
//!     bus.register(status_bar);
//!     bus.register_async(backup);
//!
//!     // Runs the status bar inline and waits for the backup to finish.
//!     bus.send_async(Saved { path: "notes.txt".into() }).await;
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
mod registry;

// ---- Public re-exports ----

pub use core::{Aggregator, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::{HandlerError, HandlerResult, RegistryError};
pub use events::{Event, EventKind};
pub use handlers::{
    AsyncHandler, AsyncHandlerFn, AsyncHandlerRef, Handler, HandlerFn, HandlerKind, HandlerRef,
    Message,
};
pub use registry::MessageKey;
