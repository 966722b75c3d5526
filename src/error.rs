//! Error types used by the registries and by message handlers.
//!
//! This module defines two main error enums:
//!
//! - [`RegistryError`]: errors raised at registration time, before any state changes.
//! - [`HandlerError`]: failures raised by individual handler invocations.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::fmt;

use thiserror::Error;

/// Result type returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

/// # Errors produced while mutating a registry.
///
/// Registration-time errors are immediate: the call fails synchronously and
/// nothing is registered.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The handler reference does not point at a live handler.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::RegistryError;
    ///
    /// let err = RegistryError::InvalidArgument { reason: "handler already dropped" };
    /// assert_eq!(err.as_label(), "registry_invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::InvalidArgument { .. } => "registry_invalid_argument",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::InvalidArgument { reason } => format!("invalid argument: {reason}"),
        }
    }
}

/// # Failures produced by a handler invocation.
///
/// A handler either returns [`HandlerError::Fail`] itself or panics; panics are
/// caught by the dispatch loop and converted into [`HandlerError::Panicked`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler reported a failure.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked while processing the message.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl HandlerError {
    /// Builds a [`HandlerError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use typebus::HandlerError;
    ///
    /// let err = HandlerError::fail("disk full");
    /// assert_eq!(err.to_string(), "handler failed: disk full");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        HandlerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// True if the failure came from a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, HandlerError::Panicked { .. })
    }
}

impl From<String> for HandlerError {
    fn from(error: String) -> Self {
        HandlerError::Fail { error }
    }
}

impl From<&str> for HandlerError {
    fn from(error: &str) -> Self {
        HandlerError::fail(error)
    }
}
