use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::{HandlerError, HandlerResult};

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs a synchronous handler call, converting a panic into [`HandlerError::Panicked`].
pub(crate) fn catch_sync(f: impl FnOnce() -> HandlerResult) -> HandlerResult {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked {
            info: panic_message(&*payload),
        }),
    }
}

/// Awaits a handler future, converting a panic into [`HandlerError::Panicked`].
///
/// `AssertUnwindSafe` is used: a handler that panics while holding a lock on
/// shared state may leave that state inconsistent.
pub(crate) async fn catch_async<F>(fut: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked {
            info: panic_message(&*payload),
        }),
    }
}
