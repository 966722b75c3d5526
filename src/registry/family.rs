//! Entry families: which handle type a registry stores for a given message type.
//!
//! A registry is generic over one family, so each list is stored as
//! `Vec<F::Entry<M>>` and the handle type can never differ between two lists
//! of the same registry.

use std::sync::{Arc, Weak};

use crate::handlers::{AsyncHandler, AsyncHandlerRef, HandlerRef, Message};

/// Maps a message type to the entry stored for it.
pub trait Family: 'static {
    /// Entry stored per subscription.
    type Entry<M: Message>: Clone + Send + Sync + 'static;

    /// False once the entry's target has been reclaimed.
    fn is_alive<M: Message>(entry: &Self::Entry<M>) -> bool;

    /// Address of the handler allocation the entry points at.
    fn target<M: Message>(entry: &Self::Entry<M>) -> *const ();
}

/// Owning entries for synchronous handlers.
#[derive(Debug)]
pub enum SyncHandlers {}

/// Owning entries for asynchronous handlers.
#[derive(Debug)]
pub enum AsyncHandlers {}

/// Non-owning entries for asynchronous handlers.
#[derive(Debug)]
pub enum WeakAsyncHandlers {}

impl Family for SyncHandlers {
    type Entry<M: Message> = HandlerRef<M>;

    #[inline]
    fn is_alive<M: Message>(_: &Self::Entry<M>) -> bool {
        true
    }

    #[inline]
    fn target<M: Message>(entry: &Self::Entry<M>) -> *const () {
        Arc::as_ptr(entry).cast::<()>()
    }
}

impl Family for AsyncHandlers {
    type Entry<M: Message> = AsyncHandlerRef<M>;

    #[inline]
    fn is_alive<M: Message>(_: &Self::Entry<M>) -> bool {
        true
    }

    #[inline]
    fn target<M: Message>(entry: &Self::Entry<M>) -> *const () {
        Arc::as_ptr(entry).cast::<()>()
    }
}

impl Family for WeakAsyncHandlers {
    type Entry<M: Message> = Weak<dyn AsyncHandler<M>>;

    #[inline]
    fn is_alive<M: Message>(entry: &Self::Entry<M>) -> bool {
        entry.strong_count() > 0
    }

    #[inline]
    fn target<M: Message>(entry: &Self::Entry<M>) -> *const () {
        Weak::as_ptr(entry).cast::<()>()
    }
}

/// Address of a shared handler, comparable with [`Family::target`].
#[inline]
pub fn address_of<T: ?Sized>(handler: &Arc<T>) -> *const () {
    Arc::as_ptr(handler).cast::<()>()
}
