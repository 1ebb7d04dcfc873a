//! Repository activity: decoding, paginated reading and review-state folding.
//!
//! - [`events`]: the `ActivityEvent` sum type and the raw-record decoder
//! - [`feed`]: lazy, page-at-a-time reader over one repository's window
//! - [`aggregate`]: fold of events into one `PullRequestState` per PR

pub mod aggregate;
pub mod events;
pub mod feed;

pub use aggregate::{PullRequestState, ReviewStateAggregator};
pub use events::{
    ActivityEvent, ActivityRecord, EventDecodeError, PullRequestActivity,
    PullRequestReviewActivity, decode_activity,
};
pub use feed::{ActivityFeedReader, FeedStats};
