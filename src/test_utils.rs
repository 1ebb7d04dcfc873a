//! Shared test utilities: an in-memory GitHub and event builders.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::{Value, json};

use crate::activity::{ActivityEvent, PullRequestActivity, PullRequestReviewActivity};
use crate::github::{GitHubApi, GitHubApiError, IssueSummary, Page, Review};
use crate::types::{Login, PrNumber, RepoId};

/// App identity the mock files issues as.
pub const MOCK_BOT: &str = "tbr-bot";

/// An issue stored by [`MockGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIssue {
    pub repo: RepoId,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
}

#[derive(Debug, Default)]
struct MockState {
    event_pages: HashMap<RepoId, Vec<Vec<Value>>>,
    event_requests: HashMap<RepoId, Vec<u32>>,
    failing_events: HashSet<RepoId>,

    review_pages: HashMap<(RepoId, PrNumber), Vec<Vec<Review>>>,
    review_requests: HashMap<(RepoId, PrNumber), usize>,
    failing_reviews: HashSet<(RepoId, PrNumber)>,

    issues: Vec<StoredIssue>,
    searches: usize,
    loose_search: bool,
    fail_search: bool,
    fail_create: bool,
    fail_create_titles: HashSet<String>,
}

/// In-memory [`GitHubApi`]. Clones share state, so a test can keep one
/// handle while the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockGitHub {
    state: Arc<Mutex<MockState>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    // ─── Activity feed ───

    pub fn set_event_pages(&self, repo: &RepoId, pages: Vec<Vec<Value>>) {
        self.with(|s| s.event_pages.insert(repo.clone(), pages));
    }

    pub fn fail_events(&self, repo: &RepoId) {
        self.with(|s| s.failing_events.insert(repo.clone()));
    }

    /// Page numbers requested for `repo`, in order.
    pub fn event_page_requests(&self, repo: &RepoId) -> Vec<u32> {
        self.with(|s| s.event_requests.get(repo).cloned().unwrap_or_default())
    }

    // ─── Review history ───

    pub fn set_review_pages(&self, repo: &RepoId, pr: PrNumber, pages: Vec<Vec<Review>>) {
        self.with(|s| s.review_pages.insert((repo.clone(), pr), pages));
    }

    pub fn fail_reviews(&self, repo: &RepoId, pr: PrNumber) {
        self.with(|s| s.failing_reviews.insert((repo.clone(), pr)));
    }

    /// Number of review pages requested for one pull request.
    pub fn review_requests(&self, repo: &RepoId, pr: PrNumber) -> usize {
        self.with(|s| {
            s.review_requests
                .get(&(repo.clone(), pr))
                .copied()
                .unwrap_or(0)
        })
    }

    // ─── Issues ───

    /// Issues created through [`GitHubApi::create_issue`], in order.
    pub fn created_issues(&self) -> Vec<StoredIssue> {
        self.with(|s| {
            s.issues
                .iter()
                .filter(|i| i.author == MOCK_BOT)
                .cloned()
                .collect()
        })
    }

    /// Stores an issue as if it already existed, without counting it as created.
    pub fn seed_issue(&self, repo: &RepoId, title: &str, author: &str) {
        self.with(|s| {
            let number = s.issues.len() as u64 + 1;
            s.issues.push(StoredIssue {
                repo: repo.clone(),
                number,
                title: title.to_string(),
                body: String::new(),
                author: format!("seed:{author}"),
            });
        });
    }

    /// Makes search return every issue in the repository, like GitHub's
    /// fuzzy title matching does for similar titles.
    pub fn match_search_loosely(&self) {
        self.with(|s| s.loose_search = true);
    }

    pub fn fail_search(&self) {
        self.with(|s| s.fail_search = true);
    }

    pub fn fail_create(&self) {
        self.with(|s| s.fail_create = true);
    }

    pub fn fail_create_for_title(&self, title: &str) {
        self.with(|s| s.fail_create_titles.insert(title.to_string()));
    }

    pub fn search_count(&self) -> usize {
        self.with(|s| s.searches)
    }
}

/// Serves `pages` one-based, advertising a next page while one remains.
fn serve_page<T: Clone>(pages: Option<&Vec<Vec<T>>>, page: u32) -> Page<T> {
    let pages = pages.map(Vec::as_slice).unwrap_or_default();
    let index = page.saturating_sub(1) as usize;
    let items = pages.get(index).cloned().unwrap_or_default();
    let next_page = (index + 1 < pages.len()).then_some(page + 1);
    Page { items, next_page }
}

impl GitHubApi for MockGitHub {
    fn list_repository_events(
        &self,
        repo: &RepoId,
        page: u32,
    ) -> impl Future<Output = Result<Page<Value>, GitHubApiError>> + Send {
        let result = self.with(|s| {
            s.event_requests.entry(repo.clone()).or_default().push(page);
            if s.failing_events.contains(repo) {
                return Err(GitHubApiError::unavailable(
                    "list_repository_events",
                    "injected failure",
                ));
            }
            Ok(serve_page(s.event_pages.get(repo), page))
        });
        async move { result }
    }

    fn list_reviews(
        &self,
        repo: &RepoId,
        pr: PrNumber,
        page: u32,
    ) -> impl Future<Output = Result<Page<Review>, GitHubApiError>> + Send {
        let key = (repo.clone(), pr);
        let result = self.with(|s| {
            *s.review_requests.entry(key.clone()).or_default() += 1;
            if s.failing_reviews.contains(&key) {
                return Err(GitHubApiError::unavailable("list_reviews", "injected failure"));
            }
            Ok(serve_page(s.review_pages.get(&key), page))
        });
        async move { result }
    }

    fn search_issues(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<IssueSummary>, GitHubApiError>> + Send {
        let result = self.with(|s| {
            s.searches += 1;
            if s.fail_search {
                return Err(GitHubApiError::unavailable("search_issues", "injected failure"));
            }
            let author_of = |i: &StoredIssue| {
                i.author
                    .strip_prefix("seed:")
                    .unwrap_or(&i.author)
                    .to_string()
            };
            Ok(s.issues
                .iter()
                .filter(|i| query.contains(&format!("repo:{}", i.repo)))
                .filter(|i| {
                    let author = author_of(i);
                    query.split_whitespace().any(|term| {
                        term == format!("author:app/{author}") || term == format!("author:{author}")
                    })
                })
                .filter(|i| s.loose_search || query.starts_with(&format!("{} in:title", i.title)))
                .map(summary)
                .collect())
        });
        async move { result }
    }

    fn create_issue(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<IssueSummary, GitHubApiError>> + Send {
        let result = self.with(|s| {
            if s.fail_create || s.fail_create_titles.contains(title) {
                return Err(GitHubApiError::unavailable("create_issue", "injected failure"));
            }
            let issue = StoredIssue {
                repo: repo.clone(),
                number: s.issues.len() as u64 + 1,
                title: title.to_string(),
                body: body.to_string(),
                author: MOCK_BOT.to_string(),
            };
            let created = summary(&issue);
            s.issues.push(issue);
            Ok(created)
        });
        async move { result }
    }
}

fn summary(issue: &StoredIssue) -> IssueSummary {
    IssueSummary {
        number: issue.number,
        title: issue.title.clone(),
        html_url: format!("https://github.com/{}/issues/{}", issue.repo, issue.number),
    }
}

// ─── Raw activity records ───

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// A raw feed record of `kind` wrapping `payload`.
pub fn raw_event(kind: &str, payload: Value) -> Value {
    let id = NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed);
    json!({
        "id": id.to_string(),
        "type": kind,
        "created_at": "2024-06-01T12:00:00Z",
        "payload": payload,
    })
}

fn raw_pull_request(n: u64, author: &str, merged: Option<bool>, merged_by: Option<&str>) -> Value {
    json!({
        "number": n,
        "user": { "login": author },
        "merged": merged,
        "merged_by": merged_by.map(|login| json!({ "login": login })),
    })
}

/// A raw "closed and merged" record.
pub fn merged_pr_event(n: u64, author: &str, merged_by: Option<&str>) -> Value {
    raw_event(
        "PullRequestEvent",
        json!({
            "action": "closed",
            "pull_request": raw_pull_request(n, author, Some(true), merged_by),
        }),
    )
}

/// A raw review submission record.
pub fn review_raw_event(n: u64, author: &str, state: &str, body: Option<&str>) -> Value {
    raw_event(
        "PullRequestReviewEvent",
        json!({
            "action": "created",
            "review": { "state": state, "body": body },
            "pull_request": raw_pull_request(n, author, None, None),
        }),
    )
}

// ─── Decoded events ───

pub fn pr_event(
    n: u64,
    action: &str,
    merged: bool,
    author: &str,
    merged_by: Option<&str>,
) -> ActivityEvent {
    ActivityEvent::PullRequest(PullRequestActivity {
        pr: PrNumber(n),
        action: action.to_string(),
        merged,
        author: Login::from(author),
        merged_by: merged_by.map(Login::from),
    })
}

pub fn review_event(
    n: u64,
    author: &str,
    merged_by: Option<&str>,
    state: &str,
    body: Option<&str>,
) -> ActivityEvent {
    ActivityEvent::PullRequestReview(PullRequestReviewActivity {
        pr: PrNumber(n),
        author: Login::from(author),
        merged_by: merged_by.map(Login::from),
        review_state: state.to_string(),
        review_body: body.map(str::to_string),
    })
}

/// A window of events over a few pull requests. Every event about one pull
/// request agrees on its author and merger, as the real feed does.
pub fn arb_event_set() -> impl Strategy<Value = Vec<ActivityEvent>> {
    let event = (
        1u64..6,
        0u8..4,
        any::<bool>(),
        any::<bool>(),
        prop::option::of("[a-zA-Z ]{0,12}"),
    )
        .prop_map(|(n, kind, flag, with_merger, body)| {
            let author = format!("author{n}");
            let merger = with_merger.then(|| format!("merger{n}"));
            match kind {
                0 => pr_event(n, "closed", flag, &author, merger.as_deref()),
                1 => pr_event(n, "opened", false, &author, None),
                2 => {
                    let state = if flag { "approved" } else { "commented" };
                    review_event(n, &author, merger.as_deref(), state, body.as_deref())
                }
                _ => ActivityEvent::Other {
                    kind: "PushEvent".to_string(),
                },
            }
        });
    prop::collection::vec(event, 0..24)
}
