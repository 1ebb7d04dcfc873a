//! The GitHub collaborator seam.
//!
//! The audit core never talks to HTTP directly. It drives this trait, which
//! exposes exactly the four queries the reconciliation cycle needs. The
//! production implementation is [`OctocrabClient`](super::OctocrabClient);
//! tests use an in-memory mock.
//!
//! Pagination is explicit: each call fetches one page and reports the next
//! page number, if any. Callers loop until `next_page` is `None`.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{Login, PrNumber, RepoId};

use super::error::GitHubApiError;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// The 1-based number of the following page, or `None` on the last page.
    pub next_page: Option<u32>,
}

/// A single pull request review from the full (non-windowed) review history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review state as GitHub reports it (`APPROVED`, `COMMENTED`, ...).
    pub state: String,
    /// Free-text review body, if any.
    pub body: Option<String>,
    /// The reviewer, if the account still exists.
    pub reviewer: Option<Login>,
}

/// The fields of an issue the escalation filer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

/// GitHub operations used by the audit.
///
/// All methods are network-fallible. The core does not retry; a failure is
/// reported upward and the next reconciliation cycle tries again.
pub trait GitHubApi: Send + Sync {
    /// Lists one page of the repository activity feed, newest first.
    ///
    /// Records are returned raw so that one malformed record can be skipped
    /// without failing the whole page.
    fn list_repository_events(
        &self,
        repo: &RepoId,
        page: u32,
    ) -> impl Future<Output = Result<Page<serde_json::Value>, GitHubApiError>> + Send;

    /// Lists one page of the complete review history of a pull request.
    fn list_reviews(
        &self,
        repo: &RepoId,
        pr: PrNumber,
        page: u32,
    ) -> impl Future<Output = Result<Page<Review>, GitHubApiError>> + Send;

    /// Runs an issue search and returns the matching issues.
    fn search_issues(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<IssueSummary>, GitHubApiError>> + Send;

    /// Creates an issue in the given repository.
    fn create_issue(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<IssueSummary, GitHubApiError>> + Send;
}
