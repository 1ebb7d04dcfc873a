//! To-be-reviewed audit bot.
//!
//! Watches a set of GitHub repositories for pull requests that were merged
//! without an approving review and files one followup issue per such pull
//! request in a tracking repository.
//!
//! The reconciliation cycle reads each repository's recent activity
//! ([`activity`]), classifies every merged-but-unapproved pull request
//! ([`review`]), and files missing followups idempotently ([`escalation`]).
//! [`scheduler`] decides when cycles run; [`server`] turns inbound
//! notifications into wakes.

pub mod activity;
pub mod audit;
pub mod config;
pub mod escalation;
pub mod github;
pub mod review;
pub mod scheduler;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
