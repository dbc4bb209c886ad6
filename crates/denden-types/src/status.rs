//! Uptime query shapes.

use serde::{Deserialize, Serialize};

/// Server uptime report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whole seconds elapsed since the dispatch engine was constructed.
    pub uptime_seconds: u64,
}

impl StatusResponse {
    /// Builds a report for the given uptime.
    #[must_use]
    pub const fn new(uptime_seconds: u64) -> Self {
        Self { uptime_seconds }
    }
}
