//! Classification of merged-without-approval candidates.
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. The author is an automation identity: merging is the approval.
//! 2. Someone other than the author merged it: that merge is the approval.
//! 3. Deep-history fallback: the complete review history is read (not the
//!    windowed feed) and any formal or free-text approval exempts the PR.
//!
//! Only a candidate that survives all three is unreviewed. Rule 3 is the
//! only rule that costs an API call, and it is what covers approvals that
//! happened before the feed window begins.

use serde::Serialize;
use tracing::debug;

use crate::activity::PullRequestState;
use crate::github::{GitHubApi, GitHubApiError};
use crate::types::{PrNumber, RepoId};

use super::policy::ApprovalPolicy;

/// Why a candidate does not need escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exemption {
    /// Authored by an automated dependency-update identity.
    AutomationAuthor,
    /// Merged by someone other than its author.
    MergedByOther,
    /// The full review history contains an approval or approval-equivalent review.
    ApprovedInHistory,
}

/// Outcome of classifying one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Exempt(Exemption),
    /// Merged without any approval: must be escalated.
    Unreviewed,
}

/// Applies the in-memory rules (1 and 2) to a pull request's window state.
pub fn cheap_exemption(state: &PullRequestState, policy: &ApprovalPolicy) -> Option<Exemption> {
    if policy.is_automation(&state.author) {
        return Some(Exemption::AutomationAuthor);
    }

    match &state.merged_by {
        Some(merged_by) if *merged_by != state.author => Some(Exemption::MergedByOther),
        _ => None,
    }
}

/// Decides, per candidate, whether it is exempt or unreviewed.
pub struct ApprovalClassifier<'a, G> {
    api: &'a G,
    policy: &'a ApprovalPolicy,
}

impl<'a, G: GitHubApi> ApprovalClassifier<'a, G> {
    pub fn new(api: &'a G, policy: &'a ApprovalPolicy) -> Self {
        ApprovalClassifier { api, policy }
    }

    /// Classifies one merged-without-approval candidate.
    ///
    /// Fails only if the review history cannot be read.
    pub async fn classify(
        &self,
        repo: &RepoId,
        pr: PrNumber,
        state: &PullRequestState,
    ) -> Result<Verdict, GitHubApiError> {
        if let Some(exemption) = cheap_exemption(state, self.policy) {
            debug!(repo = %repo, pr = %pr, ?exemption, "Candidate exempt from review");
            return Ok(Verdict::Exempt(exemption));
        }

        if self.was_ever_approved(repo, pr).await? {
            debug!(repo = %repo, pr = %pr, "Approval found in full review history");
            return Ok(Verdict::Exempt(Exemption::ApprovedInHistory));
        }

        Ok(Verdict::Unreviewed)
    }

    /// Reads the complete review history of a pull request, page by page,
    /// and returns `true` as soon as any review counts as approval.
    pub async fn was_ever_approved(
        &self,
        repo: &RepoId,
        pr: PrNumber,
    ) -> Result<bool, GitHubApiError> {
        let mut page = 1;
        loop {
            let reviews = self.api.list_reviews(repo, pr, page).await?;
            if reviews
                .items
                .iter()
                .any(|review| self.policy.counts_as_approval(review))
            {
                return Ok(true);
            }

            match reviews.next_page {
                Some(next) if next > page => page = next,
                _ => return Ok(false),
            }
        }
    }
}
