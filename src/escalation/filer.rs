//! Idempotent filing of followup issues.
//!
//! There is no local registry of filed issues. Whether a pull request has
//! already been escalated is re-derived from the tracking repository on
//! every attempt: search for the deterministic title, authored by the bot,
//! in the tracking repository, and create only when nothing matches. That
//! search is what keeps restarts and repeated cycles from filing twice.

use thiserror::Error;
use tracing::info;

use crate::github::{GitHubApi, GitHubApiError, IssueAuthor, IssueSummary};
use crate::types::{PrNumber, RepoId};

/// Where escalations are filed, and under which identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationTarget {
    /// The repository that receives every followup issue.
    pub tracking_repo: RepoId,
    /// The identity the issues are authored by.
    pub author: IssueAuthor,
}

impl EscalationTarget {
    pub fn new(tracking_repo: RepoId, author: IssueAuthor) -> Self {
        EscalationTarget {
            tracking_repo,
            author,
        }
    }

    /// The search query that finds an existing escalation for `title`.
    pub fn search_query(&self, title: &str) -> String {
        format!(
            "{} in:title repo:{} {}",
            title,
            self.tracking_repo,
            self.author.search_qualifier()
        )
    }
}

/// The deterministic followup issue title for a pull request.
pub fn escalation_title(repo: &RepoId, pr: PrNumber) -> String {
    format!("TBR {}/{}/pull/{} followup review", repo.owner, repo.repo, pr.0)
}

/// The followup issue body for a pull request.
pub fn escalation_body(repo: &RepoId, pr: PrNumber) -> String {
    format!(
        "{} was filed to-be-reviewed without any reviewer approving. \
         Someone needs to review it, followup on any changes needed, \
         and note completion by closing this issue.",
        repo.pull_request_url(pr)
    )
}

/// Errors that fail one escalation attempt.
#[derive(Debug, Error)]
pub enum EscalationError {
    /// The existence check could not be performed.
    #[error("searching for existing escalation failed: {0}")]
    Search(#[source] GitHubApiError),

    /// The issue could not be created.
    #[error("creating escalation issue failed: {0}")]
    Create(#[source] GitHubApiError),
}

/// Outcome of a successful escalation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// An escalation issue already exists; nothing was created.
    AlreadyFiled { issue: u64 },
    /// A new escalation issue was created.
    Filed(IssueSummary),
}

/// Files at most one followup issue per unreviewed pull request.
pub struct EscalationFiler<'a, G> {
    api: &'a G,
    target: &'a EscalationTarget,
}

impl<'a, G: GitHubApi> EscalationFiler<'a, G> {
    pub fn new(api: &'a G, target: &'a EscalationTarget) -> Self {
        EscalationFiler { api, target }
    }

    /// Escalates one confirmed-unreviewed pull request, unless an issue for
    /// it already exists.
    ///
    /// Any search hit counts as existing, even one whose title was edited
    /// after filing.
    pub async fn escalate(
        &self,
        repo: &RepoId,
        pr: PrNumber,
    ) -> Result<EscalationOutcome, EscalationError> {
        let title = escalation_title(repo, pr);
        let query = self.target.search_query(&title);

        let existing = self
            .api
            .search_issues(&query)
            .await
            .map_err(EscalationError::Search)?;

        if let Some(issue) = existing.first() {
            return Ok(EscalationOutcome::AlreadyFiled {
                issue: issue.number,
            });
        }

        let body = escalation_body(repo, pr);
        let issue = self
            .api
            .create_issue(&self.target.tracking_repo, &title, &body)
            .await
            .map_err(EscalationError::Create)?;

        info!(
            repo = %repo,
            pr = %pr,
            issue = issue.number,
            url = %issue.html_url,
            "Filed followup review issue"
        );

        Ok(EscalationOutcome::Filed(issue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockGitHub;

    fn target() -> EscalationTarget {
        EscalationTarget::new(
            RepoId::new("tailnet", "bugs"),
            IssueAuthor::App("tbr-bot".to_string()),
        )
    }

    #[test]
    fn title_encodes_org_repo_and_number() {
        let repo = RepoId::new("tailnet", "corp");
        assert_eq!(
            escalation_title(&repo, PrNumber(10)),
            "TBR tailnet/corp/pull/10 followup review"
        );
    }

    #[test]
    fn query_restricts_repo_and_author() {
        let query = target().search_query("TBR tailnet/corp/pull/10 followup review");
        assert_eq!(
            query,
            "TBR tailnet/corp/pull/10 followup review in:title repo:tailnet/bugs author:app/tbr-bot"
        );
    }

    #[test]
    fn body_links_pull_request_and_asks_for_closure() {
        let body = escalation_body(&RepoId::new("tailnet", "corp"), PrNumber(10));
        assert!(body.starts_with("https://github.com/tailnet/corp/pull/10 was filed"));
        assert!(body.ends_with("note completion by closing this issue."));
    }

    #[tokio::test]
    async fn files_once_then_finds_existing() {
        let mock = MockGitHub::new();
        let target = target();
        let filer = EscalationFiler::new(&mock, &target);
        let repo = RepoId::new("tailnet", "corp");

        let first = filer.escalate(&repo, PrNumber(10)).await.unwrap();
        let second = filer.escalate(&repo, PrNumber(10)).await.unwrap();

        let EscalationOutcome::Filed(issue) = first else {
            panic!("expected a new issue");
        };
        assert_eq!(
            second,
            EscalationOutcome::AlreadyFiled {
                issue: issue.number
            }
        );
        assert_eq!(mock.created_issues().len(), 1);
        assert_eq!(mock.created_issues()[0].repo, target.tracking_repo);
    }

    #[test]
    fn query_for_token_user_drops_app_prefix() {
        let target = EscalationTarget::new(
            RepoId::new("tailnet", "bugs"),
            IssueAuthor::User("octo-ops".to_string()),
        );
        assert_eq!(
            target.search_query("T"),
            "T in:title repo:tailnet/bugs author:octo-ops"
        );
    }

    #[tokio::test]
    async fn any_search_hit_counts_as_already_filed() {
        let mock = MockGitHub::new();
        let target = target();
        let repo = RepoId::new("tailnet", "corp");
        let edited = format!("{} [reviewed by dana]", escalation_title(&repo, PrNumber(10)));
        mock.seed_issue(&target.tracking_repo, &edited, "tbr-bot");
        mock.match_search_loosely();
        let filer = EscalationFiler::new(&mock, &target);

        let outcome = filer.escalate(&repo, PrNumber(10)).await.unwrap();

        assert_eq!(outcome, EscalationOutcome::AlreadyFiled { issue: 1 });
        assert!(mock.created_issues().is_empty());
    }

    #[tokio::test]
    async fn issue_by_another_author_is_not_a_match() {
        let mock = MockGitHub::new();
        let target = target();
        let repo = RepoId::new("tailnet", "corp");
        mock.seed_issue(
            &target.tracking_repo,
            &escalation_title(&repo, PrNumber(10)),
            "someone-else",
        );
        let filer = EscalationFiler::new(&mock, &target);

        let outcome = filer.escalate(&repo, PrNumber(10)).await.unwrap();

        assert!(matches!(outcome, EscalationOutcome::Filed(_)));
        assert_eq!(mock.created_issues().len(), 1);
    }

    #[tokio::test]
    async fn search_failure_prevents_creation() {
        let mock = MockGitHub::new();
        mock.fail_search();
        let target = target();
        let filer = EscalationFiler::new(&mock, &target);

        let result = filer
            .escalate(&RepoId::new("tailnet", "corp"), PrNumber(10))
            .await;

        assert!(matches!(result, Err(EscalationError::Search(_))));
        assert!(mock.created_issues().is_empty());
    }

    #[tokio::test]
    async fn create_failure_is_reported() {
        let mock = MockGitHub::new();
        mock.fail_create();
        let target = target();
        let filer = EscalationFiler::new(&mock, &target);

        let result = filer
            .escalate(&RepoId::new("tailnet", "corp"), PrNumber(10))
            .await;

        assert!(matches!(result, Err(EscalationError::Create(_))));
    }
}
