//! Process counters, injected rather than global.
//!
//! The scheduler and the auditor each hold an `Arc<AuditCounters>` handed to
//! them at construction, so tests can assert on counts without touching
//! shared process state. The HTTP server exposes a snapshot at `/debug/vars`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic counters describing the bot's activity.
#[derive(Debug, Default)]
pub struct AuditCounters {
    total_wakeups: AtomicU64,
    webhook_wakeups: AtomicU64,
    repos_checked: AtomicU64,
    issues_filed: AtomicU64,
}

/// A point-in-time copy of [`AuditCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub total_wakeups: u64,
    pub webhook_wakeups: u64,
    pub repos_checked: u64,
    pub issues_filed: u64,
}

impl AuditCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reconciliation cycle is starting.
    pub fn record_wakeup(&self) {
        self.total_wakeups.fetch_add(1, Ordering::Relaxed);
    }

    /// A webhook-triggered cooldown has elapsed.
    pub fn record_webhook_wakeup(&self) {
        self.webhook_wakeups.fetch_add(1, Ordering::Relaxed);
    }

    /// One repository is about to be audited.
    pub fn record_repo_checked(&self) {
        self.repos_checked.fetch_add(1, Ordering::Relaxed);
    }

    /// A new followup issue was created.
    pub fn record_issue_filed(&self) {
        self.issues_filed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_wakeups: self.total_wakeups.load(Ordering::Relaxed),
            webhook_wakeups: self.webhook_wakeups.load(Ordering::Relaxed),
            repos_checked: self.repos_checked.load(Ordering::Relaxed),
            issues_filed: self.issues_filed.load(Ordering::Relaxed),
        }
    }
}
