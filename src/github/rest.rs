//! `GitHubApi` implementation over the GitHub REST API.
//!
//! Key implementation details:
//! - The repository events endpoint only serves the most recent 300 events
//!   (and nothing older than 90 days); asking for a page past that cap is an
//!   error, so pagination stops at [`MAX_FEED_EVENTS`].
//! - Events are fetched as raw JSON and decoded one by one by the caller.
//! - A short page marks the end of a listing.

use serde::{Deserialize, Serialize};

use crate::types::{Login, PrNumber, RepoId};

use super::api::{GitHubApi, IssueSummary, Page, Review};
use super::client::OctocrabClient;
use super::error::GitHubApiError;

/// Page size for the events and reviews listings (GitHub's maximum).
const PER_PAGE: u32 = 100;

/// Page size for the escalation search. One hit is enough.
const SEARCH_PER_PAGE: u8 = 10;

/// Number of events the repository events endpoint will ever return.
pub const MAX_FEED_EVENTS: u32 = 300;

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u32,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    state: String,
    body: Option<String>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

/// Computes the next page of a listing that stops on a short page, and
/// optionally at a hard cap on the total number of items.
fn next_page(page: u32, items_on_page: usize, cap: Option<u32>) -> Option<u32> {
    if (items_on_page as u32) < PER_PAGE {
        return None;
    }
    match cap {
        Some(cap) if page.saturating_mul(PER_PAGE) >= cap => None,
        _ => Some(page + 1),
    }
}

impl GitHubApi for OctocrabClient {
    async fn list_repository_events(
        &self,
        repo: &RepoId,
        page: u32,
    ) -> Result<Page<serde_json::Value>, GitHubApiError> {
        let route = format!("/repos/{}/{}/events", repo.owner, repo.repo);
        let params = PageParams {
            per_page: PER_PAGE,
            page,
        };

        let items: Vec<serde_json::Value> = self
            .inner()
            .get(route, Some(&params))
            .await
            .map_err(|e| GitHubApiError::request("list_repository_events", e))?;

        let next_page = next_page(page, items.len(), Some(MAX_FEED_EVENTS));
        Ok(Page { items, next_page })
    }

    async fn list_reviews(
        &self,
        repo: &RepoId,
        pr: PrNumber,
        page: u32,
    ) -> Result<Page<Review>, GitHubApiError> {
        let route = format!("/repos/{}/{}/pulls/{}/reviews", repo.owner, repo.repo, pr.0);
        let params = PageParams {
            per_page: PER_PAGE,
            page,
        };

        let raw: Vec<RawReview> = self
            .inner()
            .get(route, Some(&params))
            .await
            .map_err(|e| GitHubApiError::request("list_reviews", e))?;

        let next_page = next_page(page, raw.len(), None);
        let items = raw
            .into_iter()
            .map(|r| Review {
                state: r.state,
                body: r.body,
                reviewer: r.user.map(|u| Login::new(u.login)),
            })
            .collect();

        Ok(Page { items, next_page })
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<IssueSummary>, GitHubApiError> {
        let page = self
            .inner()
            .search()
            .issues_and_pull_requests(query)
            .per_page(SEARCH_PER_PAGE)
            .send()
            .await
            .map_err(|e| GitHubApiError::request("search_issues", e))?;

        Ok(page
            .items
            .into_iter()
            .map(|issue| IssueSummary {
                number: issue.number,
                title: issue.title,
                html_url: issue.html_url.to_string(),
            })
            .collect())
    }

    async fn create_issue(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
    ) -> Result<IssueSummary, GitHubApiError> {
        let issue = self
            .inner()
            .issues(&repo.owner, &repo.repo)
            .create(title.to_string())
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| GitHubApiError::request("create_issue", e))?;

        Ok(IssueSummary {
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url.to_string(),
        })
    }
}
