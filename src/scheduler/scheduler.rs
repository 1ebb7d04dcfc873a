//! The wake scheduler loop.
//!
//! # State Machine
//!
//! ```text
//!            startup
//!               |
//!               v
//!   +------> Running --------> Idle
//!   |                          |  |
//!   |   periodic timer fires   |  |  webhook wake
//!   +--------------------------+  v
//!   |                        CoolingDown
//!   |     cooldown elapsed        |
//!   +-----------------------------+
//! ```
//!
//! - One cycle runs immediately at startup.
//! - A periodic tick runs a cycle right away.
//! - A webhook wake runs a cycle after the cooldown.
//! - Cycles never overlap: the loop is strictly run, wait, run.
//!
//! The loop only ends when the shutdown token is cancelled. A cycle that is
//! already running is allowed to finish first.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::audit::AuditCounters;

use super::poll::ScheduleConfig;
use super::wake::WakeReceiver;

/// Something that performs one full reconciliation cycle.
pub trait CycleRunner: Send + Sync {
    /// Runs one cycle to completion. Failures are handled (logged) inside.
    fn run_cycle(&self) -> impl Future<Output = ()> + Send;
}

/// Current scheduler state, observable through [`WakeScheduler::phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// Waiting for the timer or a wake.
    Idle,
    /// A reconciliation cycle is in progress.
    Running,
    /// A webhook wake was received; waiting out the cooldown.
    CoolingDown,
}

/// What ended a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Periodic,
    Webhook,
}

/// Drives reconciliation cycles from a periodic timer and webhook wakes.
pub struct WakeScheduler<R> {
    runner: R,
    config: ScheduleConfig,
    wake: WakeReceiver,
    counters: Arc<AuditCounters>,
    phase: watch::Sender<SchedulerPhase>,
}

impl<R: CycleRunner> WakeScheduler<R> {
    pub fn new(
        runner: R,
        config: ScheduleConfig,
        wake: WakeReceiver,
        counters: Arc<AuditCounters>,
    ) -> Self {
        let (phase, _) = watch::channel(SchedulerPhase::Idle);
        WakeScheduler {
            runner,
            config,
            wake,
            counters,
            phase,
        }
    }

    /// Subscribes to phase changes.
    pub fn phase(&self) -> watch::Receiver<SchedulerPhase> {
        self.phase.subscribe()
    }

    /// Runs the scheduler loop until `shutdown` is cancelled.
    #[instrument(skip_all)]
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            check_interval_secs = self.config.check_interval.as_secs(),
            cooldown_secs = self.config.cooldown.as_secs(),
            "Scheduler started"
        );

        let period = self.config.check_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut wake_open = true;

        loop {
            self.run_cycle().await;

            let Some(trigger) = self
                .next_trigger(&mut ticker, &mut wake_open, &shutdown)
                .await
            else {
                break;
            };

            match trigger {
                Trigger::Periodic => {
                    info!("Periodic check of repositories for unreviewed merges");
                }
                Trigger::Webhook => {
                    info!(
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "Webhook notification received, pausing before checking repositories"
                    );
                    self.phase.send_replace(SchedulerPhase::CoolingDown);

                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = time::sleep(self.config.cooldown) => {}
                    }
                    self.counters.record_webhook_wakeup();
                }
            }
        }

        self.phase.send_replace(SchedulerPhase::Idle);
        info!("Scheduler stopped");
    }

    async fn run_cycle(&mut self) {
        self.counters.record_wakeup();
        self.phase.send_replace(SchedulerPhase::Running);
        self.runner.run_cycle().await;
        self.phase.send_replace(SchedulerPhase::Idle);
    }

    /// Waits for the timer or a wake. Returns `None` on shutdown.
    async fn next_trigger(
        &mut self,
        ticker: &mut Interval,
        wake_open: &mut bool,
        shutdown: &CancellationToken,
    ) -> Option<Trigger> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                _ = ticker.tick() => return Some(Trigger::Periodic),
                wake = self.wake.recv(), if *wake_open => match wake {
                    Some(()) => return Some(Trigger::Webhook),
                    None => {
                        warn!("Wake signal closed, continuing on the periodic timer only");
                        *wake_open = false;
                    }
                },
            }
            debug!("Waiting for next trigger");
        }
    }
}
