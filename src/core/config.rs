//! # Dispatcher configuration.
//!
//! Provides [`DispatcherConfig`], the settings consumed by
//! [`Dispatcher::builder`](crate::Dispatcher::builder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the failure bus

use std::borrow::Cow;

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// ## Field semantics
/// - `name`: label attached to every log line and failure report
/// - `bus_capacity`: failure report ring buffer size (min 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Name used in logs and failure reports.
    ///
    /// Useful when an application runs several independent dispatchers.
    pub name: Cow<'static, str>,

    /// Capacity of the failure report broadcast channel.
    ///
    /// Receivers that lag behind more than `bus_capacity` reports observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl DispatcherConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Same configuration under another name.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - `name = "dispatcher"`
    /// - `bus_capacity = 256`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("dispatcher"),
            bus_capacity: 256,
        }
    }
}
