//! Timing configuration for the wake scheduler.
//!
//! # Schedule
//!
//! - **Check interval**: 1 hour by default. The activity feed only covers the
//!   most recent 300 events, so busy repositories need the interval short
//!   enough that a merge does not scroll out of the window between checks.
//! - **Cooldown**: 5 minutes by default, applied only to webhook wakes. It
//!   gives the author time to get a missing approval recorded before the
//!   followup issue is filed.

use std::time::Duration;

/// Default interval between periodic checks (1 hour).
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;

/// Default delay between a webhook wake and the cycle it triggers (5 minutes).
const DEFAULT_COOLDOWN_SECS: u64 = 300;

/// Configuration for the wake scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Interval between periodic reconciliation cycles.
    pub check_interval: Duration,

    /// Delay between a webhook wake and the cycle it triggers.
    pub cooldown: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleConfig {
    /// Creates a new `ScheduleConfig` with default values.
    pub fn new() -> Self {
        ScheduleConfig {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
        }
    }
}
