//! Subscription registries.
//!
//! This module groups the **data model** shared by the aggregator and the
//! dispatcher: the message-type key, the entry families (owning vs weak) and
//! the type-keyed [`Registry`] itself.
//!
//! ## Contents
//! - [`MessageKey`] message-type identity (`TypeId` + name for logs)
//! - `Family` which handle type a registry stores (`Arc` or `Weak`)
//! - [`Registry`] `MessageKey -> Vec<entry>` with empty-list cleanup
//!
//! ## Quick wiring
//! ```text
//! Aggregator  ── Mutex<Registry<WeakAsyncHandlers>>
//! Dispatcher  ── Mutex<{ Registry<SyncHandlers>, Registry<AsyncHandlers> }>
//! ```

mod family;
mod key;
mod map;

pub(crate) use family::{AsyncHandlers, SyncHandlers, WeakAsyncHandlers, address_of};
pub use key::MessageKey;
pub(crate) use map::Registry;
