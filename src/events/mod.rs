//! Failure reports: types and broadcast bus.
//!
//! This module groups the failure report **data model** and the **bus** the
//! dispatcher publishes them on.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] failure classification and metadata
//! - [`FailureBus`] broadcast channel stamping reports with their dispatcher
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher::send` (sync handlers, missing runtime),
//!   spawned async handler tasks.
//! - **Consumers**: whoever holds a receiver from `Dispatcher::failures()`.

mod bus;
mod event;

pub(crate) use bus::FailureBus;
pub use event::{Event, EventKind};
