//! Classification of inbound notifications by their `X-GitHub-Event` header.
//!
//! Only pull-request and review notifications can change what the next
//! reconciliation cycle would find. Everything else is acknowledged and
//! ignored; the body is never inspected.

use std::fmt;

/// Header naming the notification kind.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Kind of an inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    PullRequest,
    PullRequestReview,
    Other(String),
}

impl NotificationKind {
    /// Maps the header value onto a kind. Unknown values become `Other`.
    pub fn from_header(value: &str) -> Self {
        match value.trim() {
            "pull_request" => NotificationKind::PullRequest,
            "pull_request_review" => NotificationKind::PullRequestReview,
            other => NotificationKind::Other(other.to_string()),
        }
    }

    /// Whether this notification should wake the scheduler.
    pub fn triggers_wake(&self) -> bool {
        matches!(
            self,
            NotificationKind::PullRequest | NotificationKind::PullRequestReview
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::PullRequest => f.write_str("pull_request"),
            NotificationKind::PullRequestReview => f.write_str("pull_request_review"),
            NotificationKind::Other(kind) => f.write_str(kind),
        }
    }
}
