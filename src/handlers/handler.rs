//! # Handler traits.
//!
//! A handler is invoked with a message value whenever a message of its type is
//! published. Two flavours exist:
//!
//! - [`Handler`] runs inline on the sender's thread and borrows the message.
//! - [`AsyncHandler`] returns a future and receives a shared `Arc<M>`, so it can
//!   be moved onto an independent task.
//!
//! Registries compare handlers by the address of their shared allocation: two
//! clones of the same [`HandlerRef`] are the same handler, two separately
//! allocated handlers are never equal even when they wrap identical closures.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerResult;

/// Marker for types that can travel through a registry.
///
/// Blanket-implemented for every `Send + Sync + 'static` type; it exists to keep
/// bounds short.
pub trait Message: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Message for T {}

/// Shared handle to a synchronous handler.
pub type HandlerRef<M> = Arc<dyn Handler<M>>;

/// Shared handle to an asynchronous handler.
pub type AsyncHandlerRef<M> = Arc<dyn AsyncHandler<M>>;

/// # Synchronous handler.
///
/// Called on the sender's thread, in registration order. Implementations should
/// return quickly; anything slow belongs in an [`AsyncHandler`].
///
/// # Example
/// ```
/// use typebus::{Handler, HandlerResult};
///
/// struct Audit;
///
/// impl Handler<String> for Audit {
///     fn handle(&self, message: &String) -> HandlerResult {
///         if message.is_empty() {
///             return Err("empty message".into());
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &str { "audit" }
/// }
/// ```
pub trait Handler<M: Message>: Send + Sync + 'static {
    /// Handles one message.
    fn handle(&self, message: &M) -> HandlerResult;

    /// Human-readable name (for logs/failure reports).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// # Asynchronous handler.
///
/// The returned future must be `Send`: the dispatcher may drive it on another
/// worker thread.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use typebus::{AsyncHandler, HandlerResult};
///
/// struct Mailer;
///
/// #[async_trait]
/// impl AsyncHandler<String> for Mailer {
///     async fn handle(&self, message: Arc<String>) -> HandlerResult {
///         let _ = message.len();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncHandler<M: Message>: Send + Sync + 'static {
    /// Handles one message.
    async fn handle(&self, message: Arc<M>) -> HandlerResult;

    /// Human-readable name (for logs/failure reports).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Which dispatch path a handler belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Invoked inline by the sender.
    Sync,
    /// Invoked as a future, spawned or awaited.
    Async,
}

impl HandlerKind {
    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerKind::Sync => "sync",
            HandlerKind::Async => "async",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
