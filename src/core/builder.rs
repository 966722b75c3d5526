use tokio::runtime::Handle;

use super::config::DispatcherConfig;
use super::dispatcher::Dispatcher;

/// Builder for constructing a [`Dispatcher`] with optional settings.
#[derive(Debug)]
pub struct DispatcherBuilder {
    cfg: DispatcherConfig,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: DispatcherConfig) -> Self {
        Self { cfg, runtime: None }
    }

    /// Pins async handlers to `runtime`.
    ///
    /// Without it, async handlers are spawned on the runtime the sender is
    /// running on. Pinning lets plain threads (UI loops, blocking workers)
    /// call `send` too.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds and returns the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher::new_internal(self.cfg, self.runtime)
    }
}
