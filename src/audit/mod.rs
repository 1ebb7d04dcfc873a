//! Reconciliation over all monitored repositories.

pub mod auditor;
pub mod counters;

pub use auditor::{AuditError, AuditSettings, Auditor, CycleReport, RepoAuditReport};
pub use counters::{AuditCounters, CounterSnapshot};
