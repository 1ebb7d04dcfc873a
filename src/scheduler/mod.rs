//! Wake/debounce scheduling of reconciliation cycles.
//!
//! Cycles are triggered by:
//! - startup (immediately)
//! - a periodic timer
//! - webhook wakes, debounced by a cooldown and coalesced into one pending slot

pub mod poll;
#[allow(clippy::module_inception)]
pub mod scheduler;
pub mod wake;

pub use poll::ScheduleConfig;
pub use scheduler::{CycleRunner, SchedulerPhase, WakeScheduler};
pub use wake::{WakeHandle, WakeOutcome, WakeReceiver, wake_channel};
