use std::time::Duration;

use outpost_core::{AppError, AppResult};

/// How long a worker may go without finding work before it exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleLimit {
    /// Never exit because of idleness.
    Unlimited,
    /// Exit once the idle time strictly exceeds the duration.
    After(Duration),
}

impl IdleLimit {
    /// Builds a limit from seconds, where `-1` means unlimited.
    pub fn from_seconds(seconds: i64) -> AppResult<Self> {
        match seconds {
            -1 => Ok(Self::Unlimited),
            value if value >= 0 => Ok(Self::After(Duration::from_secs(value.unsigned_abs()))),
            value => Err(AppError::Validation(format!(
                "max idle time must be -1 or a non-negative number of seconds, got {value}"
            ))),
        }
    }

    /// Returns true when `idle_for` is past the limit.
    #[must_use]
    pub fn is_exceeded(&self, idle_for: Duration) -> bool {
        match self {
            Self::Unlimited => false,
            Self::After(limit) => idle_for > *limit,
        }
    }

    /// Returns the idle budget left, or `None` when unlimited.
    #[must_use]
    pub fn remaining(&self, idle_for: Duration) -> Option<Duration> {
        match self {
            Self::Unlimited => None,
            Self::After(limit) => Some(limit.saturating_sub(idle_for)),
        }
    }
}
