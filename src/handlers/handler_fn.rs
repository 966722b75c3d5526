//! # Closure-backed handlers (`HandlerFn`, `AsyncHandlerFn`)
//!
//! [`HandlerFn`] wraps `F: Fn(&M) -> HandlerResult`; [`AsyncHandlerFn`] wraps
//! `F: Fn(Arc<M>) -> Fut`, producing a fresh future per invocation.
//!
//! Each `arc` call allocates a new handler, so it is also a new identity: keep
//! the returned handle around if you intend to unregister it later.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use typebus::{AsyncHandlerFn, AsyncHandlerRef, HandlerError, HandlerFn, HandlerRef};
//!
//! let on_text: HandlerRef<String> = HandlerFn::arc("print", |msg: &String| {
//!     println!("{msg}");
//!     Ok(())
//! });
//!
//! let on_text_later: AsyncHandlerRef<String> =
//!     AsyncHandlerFn::arc("store", |msg: Arc<String>| async move {
//!         let _ = msg.len();
//!         Ok::<_, HandlerError>(())
//!     });
//!
//! assert_eq!(on_text.name(), "print");
//! assert_eq!(on_text_later.name(), "store");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::handler::{AsyncHandler, Handler, Message};
use crate::error::HandlerResult;

/// Function-backed synchronous handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a
    /// [`HandlerRef`](crate::HandlerRef).
    pub fn new<M>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        M: Message,
        F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc<M>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        M: Message,
        F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
    {
        Arc::new(Self::new::<M>(name, f))
    }
}

impl<M, F> Handler<M> for HandlerFn<F>
where
    M: Message,
    F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, message: &M) -> HandlerResult {
        (self.f)(message)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Function-backed asynchronous handler.
///
/// Wraps a closure that *creates* a new future per invocation.
#[derive(Debug)]
pub struct AsyncHandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> AsyncHandlerFn<F> {
    /// Creates a new function-backed async handler.
    pub fn new<M, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        M: Message,
        F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc<M, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        M: Message,
        F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Arc::new(Self::new::<M, Fut>(name, f))
    }
}

#[async_trait]
impl<M, F, Fut> AsyncHandler<M> for AsyncHandlerFn<F>
where
    M: Message,
    F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, message: Arc<M>) -> HandlerResult {
        (self.f)(message).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::{AsyncHandlerRef, HandlerRef};

    #[test]
    fn test_handler_fn_invokes_closure() {
        let h: HandlerRef<u32> = HandlerFn::arc("even", |n: &u32| {
            if n % 2 == 0 {
                Ok(())
            } else {
                Err(HandlerError::fail(format!("{n} is odd")))
            }
        });

        assert_eq!(h.name(), "even");
        assert!(h.handle(&4).is_ok());
        assert_eq!(h.handle(&3), Err(HandlerError::fail("3 is odd")));
    }

    #[tokio::test]
    async fn test_async_handler_fn_creates_fresh_future() {
        let h: AsyncHandlerRef<String> =
            AsyncHandlerFn::arc("len", |msg: Arc<String>| async move {
                if msg.is_empty() {
                    return Err(HandlerError::fail("empty"));
                }
                Ok(())
            });

        assert_eq!(h.name(), "len");
        assert!(h.handle(Arc::new("a".to_string())).await.is_ok());
        assert!(h.handle(Arc::new(String::new())).await.is_err());
        assert!(h.handle(Arc::new("b".to_string())).await.is_ok());
    }

    #[test]
    fn test_default_name_is_type_name() {
        struct Plain;
        impl Handler<u8> for Plain {
            fn handle(&self, _: &u8) -> HandlerResult {
                Ok(())
            }
        }
        assert!(Handler::<u8>::name(&Plain).ends_with("Plain"));
    }
}
