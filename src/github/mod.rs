//! GitHub API access.
//!
//! This module provides the [`GitHubApi`] trait the audit core is written
//! against, and its octocrab-backed implementation.
//!
//! Key features:
//! - Explicit page-at-a-time pagination, so callers decide how far to read
//! - Raw activity records, decoded downstream so one bad record is skippable
//! - No retries: failures surface to the caller and the next cycle retries

mod api;
mod auth;
mod client;
mod error;
mod rest;

pub use api::{GitHubApi, IssueSummary, Page, Review};
pub use auth::{GitHubAuth, GitHubAuthError, IssueAuthor, connect};
pub use client::OctocrabClient;
pub use error::GitHubApiError;
pub use rest::MAX_FEED_EVENTS;
