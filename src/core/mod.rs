//! Dispatch core: the two buses and their configuration.
//!
//! The public API from this module is [`Aggregator`] (weak subscriptions,
//! sequential awaited publish, failures propagate) and [`Dispatcher`] (owned
//! registrations, sync + async fan-out, failures isolated).
//!
//! Internal modules:
//! - [`aggregator`]: per-instance bus over a weak registry;
//! - [`dispatcher`]: shared bus over two strong registries;
//! - [`builder`]: optional settings for the dispatcher (runtime pinning);
//! - [`config`]: dispatcher configuration;
//! - [`panic`]: panic capture around handler calls.

mod aggregator;
mod builder;
mod config;
mod dispatcher;
mod panic;

pub use aggregator::Aggregator;
pub use builder::DispatcherBuilder;
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
