//! Folding activity events into per-pull-request review state.
//!
//! The fold is a set of monotonic updates: flags only ever go from `false`
//! to `true`, and identities are overwritten with the value the event
//! carries (which is the same for every event about one pull request).
//! That makes the result independent of event order and of duplicates,
//! both of which the paginated feed can produce.

use std::collections::BTreeMap;

use crate::types::{Login, PrNumber};

use super::events::{ActivityEvent, PullRequestActivity, PullRequestReviewActivity};

/// Review state of one pull request, as far as the window shows.
///
/// `approved == false` only means no approval event fell inside the window.
/// It is not proof that the pull request was never approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestState {
    /// The pull request was merged during the window.
    pub submitted: bool,
    /// An approving review was observed during the window.
    pub approved: bool,
    pub author: Login,
    pub merged_by: Option<Login>,
}

impl PullRequestState {
    fn new(author: Login) -> Self {
        PullRequestState {
            submitted: false,
            approved: false,
            author,
            merged_by: None,
        }
    }

    /// Merged, with no approval seen in the window.
    pub fn is_candidate(&self) -> bool {
        self.submitted && !self.approved
    }

    fn record_identities(&mut self, author: &Login, merged_by: Option<&Login>) {
        self.author = author.clone();
        if let Some(merged_by) = merged_by {
            self.merged_by = Some(merged_by.clone());
        }
    }
}

/// Builds the per-pull-request state map for one repository cycle.
#[derive(Debug, Clone, Default)]
pub struct ReviewStateAggregator {
    pulls: BTreeMap<PrNumber, PullRequestState>,
}

impl ReviewStateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the state map.
    pub fn apply(&mut self, event: &ActivityEvent) {
        match event {
            ActivityEvent::PullRequest(e) => self.apply_pull_request(e),
            ActivityEvent::PullRequestReview(e) => self.apply_review(e),
            ActivityEvent::Other { .. } => {}
        }
    }

    /// Folds a batch of events.
    pub fn apply_all<'e>(&mut self, events: impl IntoIterator<Item = &'e ActivityEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    fn apply_pull_request(&mut self, e: &PullRequestActivity) {
        let state = self
            .pulls
            .entry(e.pr)
            .or_insert_with(|| PullRequestState::new(e.author.clone()));
        state.record_identities(&e.author, e.merged_by.as_ref());
        if e.is_merge() {
            state.submitted = true;
        }
    }

    fn apply_review(&mut self, e: &PullRequestReviewActivity) {
        let state = self
            .pulls
            .entry(e.pr)
            .or_insert_with(|| PullRequestState::new(e.author.clone()));
        state.record_identities(&e.author, e.merged_by.as_ref());
        if e.is_approval() {
            state.approved = true;
        }
    }

    /// Number of distinct pull requests seen.
    pub fn len(&self) -> usize {
        self.pulls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulls.is_empty()
    }

    /// Merged pull requests with no approval in the window, in ascending order.
    pub fn candidates(&self) -> impl Iterator<Item = (PrNumber, &PullRequestState)> {
        self.pulls
            .iter()
            .filter(|(_, state)| state.is_candidate())
            .map(|(pr, state)| (*pr, state))
    }

    /// Consumes the aggregator, returning the full state map.
    pub fn into_states(self) -> BTreeMap<PrNumber, PullRequestState> {
        self.pulls
    }
}
