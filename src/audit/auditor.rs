//! The reconciliation cycle.
//!
//! One cycle walks every monitored repository in order. For each one it
//! reads the activity window, folds it into per-PR state, classifies every
//! merged-without-approval candidate and escalates the ones that are
//! unreviewed.
//!
//! # Failure Isolation
//!
//! - Feed or review-history failure: the repository is abandoned for this
//!   cycle (no action on a partial picture); other repositories proceed.
//! - Escalation failure: only that PR is affected; the remaining candidates
//!   of the repository are still processed.
//!
//! Nothing is retried here. Every cycle recomputes from scratch, and an
//! unreviewed merge stays unreviewed until it is escalated, so the next
//! cycle picks up whatever this one missed.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::activity::{ActivityFeedReader, FeedStats, ReviewStateAggregator};
use crate::escalation::{EscalationFiler, EscalationOutcome, EscalationTarget};
use crate::github::{GitHubApi, GitHubApiError};
use crate::review::{ApprovalClassifier, ApprovalPolicy, Exemption, Verdict};
use crate::scheduler::CycleRunner;
use crate::types::{PrNumber, RepoId};

use super::counters::AuditCounters;

/// Errors that abort the audit of one repository.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The activity feed could not be read.
    #[error("reading activity feed failed: {0}")]
    Feed(#[source] GitHubApiError),

    /// The review history of a candidate could not be read.
    #[error("reading review history of {pr} failed: {source}")]
    ReviewHistory {
        pr: PrNumber,
        #[source]
        source: GitHubApiError,
    },
}

/// What the auditor needs to know about the organization.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// The organization owning the monitored repositories.
    pub org: String,
    /// Monitored repository names, audited in this order.
    pub repos: Vec<String>,
    /// Where followup issues go.
    pub target: EscalationTarget,
    pub policy: ApprovalPolicy,
}

/// Result of auditing one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoAuditReport {
    pub feed: FeedStats,
    /// Distinct pull requests seen in the window.
    pub pull_requests: usize,
    /// Merged pull requests with no approval in the window.
    pub candidates: Vec<PrNumber>,
    pub exempted: Vec<(PrNumber, Exemption)>,
    /// Newly filed escalations: (pull request, issue number).
    pub filed: Vec<(PrNumber, u64)>,
    /// Unreviewed pull requests that already had an escalation.
    pub already_filed: Vec<(PrNumber, u64)>,
    /// Unreviewed pull requests whose escalation attempt failed.
    pub escalation_failures: Vec<PrNumber>,
}

/// Result of one full cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub repos: Vec<(RepoId, Result<RepoAuditReport, AuditError>)>,
}

impl CycleReport {
    /// Number of repositories whose audit was aborted.
    pub fn failed_repos(&self) -> usize {
        self.repos.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// Number of issues filed across all repositories.
    pub fn issues_filed(&self) -> usize {
        self.repos
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|r| r.filed.len())
            .sum()
    }
}

/// Runs reconciliation cycles against a GitHub API.
pub struct Auditor<G> {
    api: G,
    settings: AuditSettings,
    counters: Arc<AuditCounters>,
}

impl<G: GitHubApi> Auditor<G> {
    pub fn new(api: G, settings: AuditSettings, counters: Arc<AuditCounters>) -> Self {
        Auditor {
            api,
            settings,
            counters,
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Audits every monitored repository, one after the other.
    pub async fn audit_all(&self) -> CycleReport {
        let mut repos = Vec::with_capacity(self.settings.repos.len());

        for name in &self.settings.repos {
            let repo = RepoId::new(&self.settings.org, name);
            self.counters.record_repo_checked();

            let result = self.audit_repository(&repo).await;
            if let Err(e) = &result {
                error!(repo = %repo, error = %e, "Repository audit aborted");
            }
            repos.push((repo, result));
        }

        CycleReport { repos }
    }

    /// Audits one repository.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn audit_repository(&self, repo: &RepoId) -> Result<RepoAuditReport, AuditError> {
        let mut reader = ActivityFeedReader::new(&self.api, repo);
        let mut aggregator = ReviewStateAggregator::new();
        while let Some(batch) = reader.next_batch().await.map_err(AuditError::Feed)? {
            aggregator.apply_all(&batch);
        }

        let mut report = RepoAuditReport {
            feed: reader.into_stats(),
            pull_requests: aggregator.len(),
            ..RepoAuditReport::default()
        };

        let classifier = ApprovalClassifier::new(&self.api, &self.settings.policy);
        let filer = EscalationFiler::new(&self.api, &self.settings.target);

        for (pr, state) in aggregator.candidates() {
            report.candidates.push(pr);

            let verdict = classifier
                .classify(repo, pr, state)
                .await
                .map_err(|source| AuditError::ReviewHistory { pr, source })?;

            match verdict {
                Verdict::Exempt(exemption) => report.exempted.push((pr, exemption)),
                Verdict::Unreviewed => match filer.escalate(repo, pr).await {
                    Ok(EscalationOutcome::Filed(issue)) => {
                        self.counters.record_issue_filed();
                        report.filed.push((pr, issue.number));
                    }
                    Ok(EscalationOutcome::AlreadyFiled { issue }) => {
                        debug!(pr = %pr, issue, "Followup issue already filed");
                        report.already_filed.push((pr, issue));
                    }
                    Err(e) => {
                        error!(pr = %pr, error = %e, "Escalation failed");
                        report.escalation_failures.push(pr);
                    }
                },
            }
        }

        if report.feed.skipped > 0 {
            warn!(skipped = report.feed.skipped, "Some activity records were unreadable");
        }

        info!(
            pages = report.feed.pages,
            window_start = ?report.feed.oldest,
            pull_requests = report.pull_requests,
            candidates = report.candidates.len(),
            exempted = report.exempted.len(),
            filed = report.filed.len(),
            already_filed = report.already_filed.len(),
            "Repository audited"
        );

        Ok(report)
    }
}

impl<G: GitHubApi> CycleRunner for Auditor<G> {
    async fn run_cycle(&self) {
        let report = self.audit_all().await;
        info!(
            repos = report.repos.len(),
            failed = report.failed_repos(),
            filed = report.issues_filed(),
            "Reconciliation cycle complete"
        );
    }
}
