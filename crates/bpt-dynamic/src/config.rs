//! Dynamic confirmation configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and probing knobs of the live runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicConfig {
    /// Overall deadline for one expected state update to appear
    pub result_wait_ms: u64,

    /// Delay between two snapshot lookups
    pub poll_interval_ms: u64,

    /// Trigger roles beyond the first are probed only above this count
    pub role_probe_threshold: usize,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            result_wait_ms: 5000,
            poll_interval_ms: 500,
            role_probe_threshold: 2,
        }
    }
}

impl DynamicConfig {
    #[must_use]
    pub fn with_result_wait_ms(mut self, ms: u64) -> Self {
        self.result_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn with_role_probe_threshold(mut self, threshold: usize) -> Self {
        self.role_probe_threshold = threshold;
        self
    }

    #[inline]
    #[must_use]
    pub fn result_wait(&self) -> Duration {
        Duration::from_millis(self.result_wait_ms)
    }

    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
