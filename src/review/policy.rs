//! Approval policy: who is exempt, and which free text counts as approval.
//!
//! The allow-lists are configuration data. The defaults reproduce the
//! established behavior: dependabot merges are self-approving, a review body
//! containing "LGTM" or "banger pr" counts as approval, and a review body that
//! is exactly a ship emoji or `:shipit:` counts as approval.

use serde::Serialize;

use crate::github::Review;
use crate::types::Login;

/// Default automated dependency-update identity.
pub const DEFAULT_AUTOMATION_AUTHORS: &[&str] = &["dependabot[bot]"];

/// Default substrings that make a review body an approval.
pub const DEFAULT_APPROVAL_PHRASES: &[&str] = &["LGTM", "banger pr"];

/// Default whole-body tokens that make a review an approval.
pub const DEFAULT_APPROVAL_TOKENS: &[&str] = &["\u{1F6A2}", ":shipit:"];

/// The fixed exemption and approval-equivalence rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalPolicy {
    automation_authors: Vec<Login>,
    /// Stored lowercased.
    approval_phrases: Vec<String>,
    /// Stored lowercased.
    approval_tokens: Vec<String>,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        ApprovalPolicy::new(
            DEFAULT_AUTOMATION_AUTHORS.iter().copied(),
            DEFAULT_APPROVAL_PHRASES.iter().copied(),
            DEFAULT_APPROVAL_TOKENS.iter().copied(),
        )
    }
}

impl ApprovalPolicy {
    /// Builds a policy. Blank entries are dropped: an empty phrase would
    /// match every review body.
    pub fn new<A, P, T>(
        automation_authors: impl IntoIterator<Item = A>,
        approval_phrases: impl IntoIterator<Item = P>,
        approval_tokens: impl IntoIterator<Item = T>,
    ) -> Self
    where
        A: AsRef<str>,
        P: AsRef<str>,
        T: AsRef<str>,
    {
        ApprovalPolicy {
            automation_authors: automation_authors
                .into_iter()
                .map(|a| a.as_ref().trim().to_string())
                .filter(|a| !a.is_empty())
                .map(Login::new)
                .collect(),
            approval_phrases: normalize(approval_phrases),
            approval_tokens: normalize(approval_tokens),
        }
    }

    /// True if `author` is an automated dependency-update identity.
    pub fn is_automation(&self, author: &Login) -> bool {
        self.automation_authors.contains(author)
    }

    /// True if the review is a formal approval or an approval-equivalent
    /// free-text signal.
    pub fn counts_as_approval(&self, review: &Review) -> bool {
        if review.state.eq_ignore_ascii_case("approved") {
            return true;
        }
        review
            .body
            .as_deref()
            .is_some_and(|body| self.body_counts_as_approval(body))
    }

    /// True if a review body alone signals approval.
    pub fn body_counts_as_approval(&self, body: &str) -> bool {
        let lowered = body.to_lowercase();
        if self
            .approval_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
        {
            return true;
        }

        let trimmed = lowered.trim();
        self.approval_tokens.iter().any(|token| token == trimmed)
    }

    pub fn automation_authors(&self) -> &[Login] {
        &self.automation_authors
    }

    pub fn approval_phrases(&self) -> &[String] {
        &self.approval_phrases
    }

    pub fn approval_tokens(&self) -> &[String] {
        &self.approval_tokens
    }
}

fn normalize<S: AsRef<str>>(entries: impl IntoIterator<Item = S>) -> Vec<String> {
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
