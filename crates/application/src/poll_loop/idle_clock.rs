use std::time::Duration;

use tokio::time::Instant;

/// Monotonic timestamp of the last job any endpoint yielded.
#[derive(Debug, Clone, Copy)]
pub struct IdleClock {
    last_job_at: Instant,
}

impl IdleClock {
    /// Starts the clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            last_job_at: Instant::now(),
        }
    }

    /// Marks now as the time of the last job.
    pub fn reset(&mut self) {
        self.last_job_at = Instant::now();
    }

    /// Time elapsed since the last job or since start.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_job_at.elapsed()
    }

    /// Instant of the last job or of start.
    #[must_use]
    pub fn last_job_at(&self) -> Instant {
        self.last_job_at
    }
}
