//! Typed repository activity records.
//!
//! The repository events feed mixes dozens of event kinds. The audit only
//! cares about two of them, so every record is decoded once, at the feed
//! boundary, into the closed [`ActivityEvent`] sum type. Everything else
//! becomes [`ActivityEvent::Other`] and is ignored downstream.
//!
//! # Decoding Strategy
//!
//! 1. The envelope (`id`, `type`, `created_at`, `payload`) is decoded first
//! 2. The payload is decoded according to `type`
//! 3. Unknown kinds decode to `Other` (ignored, not an error)
//! 4. Malformed payloads of a relevant kind return `Err`; the feed reader
//!    logs and skips them

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::types::{Login, PrNumber};

/// Activity kind of a pull request lifecycle event.
pub const PULL_REQUEST_EVENT: &str = "PullRequestEvent";

/// Activity kind of a pull request review event.
pub const PULL_REQUEST_REVIEW_EVENT: &str = "PullRequestReviewEvent";

/// Error for an activity record that cannot be decoded.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    /// The record is not an event envelope at all.
    #[error("malformed activity record: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The record is a relevant kind but its payload is missing required fields.
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A decoded activity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// GitHub's event id, when present.
    pub id: Option<String>,
    /// When the event happened.
    pub created_at: Option<DateTime<Utc>>,
    /// The event itself.
    pub event: ActivityEvent,
}

/// The activity the audit reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    /// A pull request was opened, closed, merged, edited, ...
    PullRequest(PullRequestActivity),

    /// A review was submitted on a pull request.
    PullRequestReview(PullRequestReviewActivity),

    /// Any other kind (pushes, issue comments, forks, ...). Ignored.
    Other { kind: String },
}

impl ActivityEvent {
    /// Returns the pull request this event refers to, if any.
    pub fn pr_number(&self) -> Option<PrNumber> {
        match self {
            ActivityEvent::PullRequest(e) => Some(e.pr),
            ActivityEvent::PullRequestReview(e) => Some(e.pr),
            ActivityEvent::Other { .. } => None,
        }
    }
}

/// A `PullRequestEvent` from the activity feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestActivity {
    pub pr: PrNumber,
    /// The lifecycle action, e.g. `closed`.
    pub action: String,
    /// Whether the pull request was merged at the time of the event.
    pub merged: bool,
    pub author: Login,
    pub merged_by: Option<Login>,
}

impl PullRequestActivity {
    /// True if this event records the pull request being merged.
    pub fn is_merge(&self) -> bool {
        self.merged && self.action.eq_ignore_ascii_case("closed")
    }
}

/// A `PullRequestReviewEvent` from the activity feed.
///
/// Review events embed the pull request, so they also carry its author and
/// merger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestReviewActivity {
    pub pr: PrNumber,
    pub author: Login,
    pub merged_by: Option<Login>,
    /// The review state, e.g. `approved`.
    pub review_state: String,
    /// The reviewer's free-text comment.
    pub review_body: Option<String>,
}

impl PullRequestReviewActivity {
    /// True if the review is a formal approval.
    pub fn is_approval(&self) -> bool {
        self.review_state.eq_ignore_ascii_case("approved")
    }
}

// ============================================================================
// Raw payload structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    user: RawUser,
    merged: Option<bool>,
    merged_by: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    state: String,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestReviewPayload {
    review: RawReview,
    pull_request: RawPullRequest,
}

/// Decodes one raw record from the repository events feed.
///
/// # Returns
///
/// * `Ok(record)` with `ActivityEvent::Other` for kinds the audit ignores
/// * `Err(e)` if the envelope, or the payload of a relevant kind, is malformed
///
/// # Examples
///
/// ```
/// use tbr_audit::activity::{ActivityEvent, decode_activity};
///
/// let raw = serde_json::json!({
///     "id": "1",
///     "type": "PullRequestEvent",
///     "payload": {
///         "action": "closed",
///         "pull_request": {
///             "number": 10,
///             "merged": true,
///             "user": { "login": "alice" },
///             "merged_by": { "login": "alice" }
///         }
///     }
/// });
///
/// let record = decode_activity(&raw).unwrap();
/// assert!(matches!(record.event, ActivityEvent::PullRequest(ref pr) if pr.is_merge()));
/// ```
pub fn decode_activity(raw: &serde_json::Value) -> Result<ActivityRecord, EventDecodeError> {
    let envelope = RawEnvelope::deserialize(raw).map_err(EventDecodeError::Envelope)?;

    let event = match envelope.kind.as_deref() {
        Some(PULL_REQUEST_EVENT) => {
            let payload = RawPullRequestPayload::deserialize(&envelope.payload).map_err(|e| {
                EventDecodeError::Payload {
                    kind: PULL_REQUEST_EVENT,
                    source: e,
                }
            })?;
            let pr = payload.pull_request;
            ActivityEvent::PullRequest(PullRequestActivity {
                pr: PrNumber(pr.number),
                action: payload.action,
                merged: pr.merged.unwrap_or(false),
                author: Login::new(pr.user.login),
                merged_by: pr.merged_by.map(|u| Login::new(u.login)),
            })
        }
        Some(PULL_REQUEST_REVIEW_EVENT) => {
            let payload =
                RawPullRequestReviewPayload::deserialize(&envelope.payload).map_err(|e| {
                    EventDecodeError::Payload {
                        kind: PULL_REQUEST_REVIEW_EVENT,
                        source: e,
                    }
                })?;
            let pr = payload.pull_request;
            ActivityEvent::PullRequestReview(PullRequestReviewActivity {
                pr: PrNumber(pr.number),
                author: Login::new(pr.user.login),
                merged_by: pr.merged_by.map(|u| Login::new(u.login)),
                review_state: payload.review.state,
                review_body: payload.review.body,
            })
        }
        other => ActivityEvent::Other {
            kind: other.unwrap_or_default().to_string(),
        },
    };

    Ok(ActivityRecord {
        id: envelope.id,
        created_at: envelope.created_at,
        event,
    })
}
