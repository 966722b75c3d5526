//! # Handler abstractions.
//!
//! This module provides the handler-related types:
//! - [`Handler`] - trait for synchronous handlers, run inline by the sender
//! - [`AsyncHandler`] - trait for asynchronous handlers, awaited or spawned
//! - [`HandlerFn`], [`AsyncHandlerFn`] - closure-backed implementations
//! - [`HandlerRef`], [`AsyncHandlerRef`] - shared handles (`Arc<dyn ...>`) used as
//!   registration identity

mod handler;
mod handler_fn;

pub use handler::{AsyncHandler, AsyncHandlerRef, Handler, HandlerKind, HandlerRef, Message};
pub use handler_fn::{AsyncHandlerFn, HandlerFn};
