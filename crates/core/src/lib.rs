//! Shared primitives for all Rust crates in Outpost.

#![forbid(unsafe_code)]

/// Content hashing helpers.
pub mod digest;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use digest::sha256_hex;

/// Result type used across Outpost crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input, configuration, or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Coordinator rejected the worker credentials (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Coordinator could not be reached at the connection level.
    #[error("transport error: {0}")]
    Transport(String),

    /// Coordinator answered with an unexpected status or body.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local filesystem or process failure.
    #[error("io error: {0}")]
    Io(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true when the coordinator no longer recognises this worker.
    #[must_use]
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns true for connection-level failures that warrant a long backoff.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
