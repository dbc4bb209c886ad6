//! Process uptime reporting.

use std::time::{Duration, Instant};

use denden_types::StatusResponse;

/// Reports time elapsed since construction using a monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    started: Instant,
}

impl StatusReporter {
    /// Starts the uptime clock now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Elapsed time since construction.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Uptime in whole seconds.
    #[must_use]
    pub fn status(&self) -> StatusResponse {
        StatusResponse::new(self.uptime().as_secs())
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
