//! Paginated reader over one repository's activity feed.
//!
//! [`ActivityFeedReader`] is lazy: each call to [`next_batch`] fetches one
//! page and decodes it, so the aggregator can fold events as they arrive.
//! Malformed records are logged and skipped; a transport failure ends the
//! read and is returned to the caller, which abandons the repository for
//! this cycle rather than acting on a partial window.
//!
//! [`next_batch`]: ActivityFeedReader::next_batch

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::github::{GitHubApi, GitHubApiError};
use crate::types::RepoId;

use super::events::{ActivityEvent, decode_activity};

/// Where the reader is in the pagination sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Page(u32),
    Exhausted,
}

/// Reads the activity window of one repository, page by page.
pub struct ActivityFeedReader<'a, G> {
    api: &'a G,
    repo: &'a RepoId,
    cursor: Cursor,
    stats: FeedStats,
}

/// Bookkeeping about the window that was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Pages fetched so far.
    pub pages: u32,
    /// Records decoded successfully (including ignored kinds).
    pub records: usize,
    /// Records skipped because their payload was malformed.
    pub skipped: usize,
    /// Timestamp of the oldest record seen, i.e. the start of the window.
    pub oldest: Option<DateTime<Utc>>,
}

impl<'a, G: GitHubApi> ActivityFeedReader<'a, G> {
    /// Creates a reader positioned at the first page.
    pub fn new(api: &'a G, repo: &'a RepoId) -> Self {
        ActivityFeedReader {
            api,
            repo,
            cursor: Cursor::Page(1),
            stats: FeedStats::default(),
        }
    }

    /// Fetches and decodes the next page.
    ///
    /// Returns `Ok(None)` once the collaborator reports no further pages.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<ActivityEvent>>, GitHubApiError> {
        let page = match self.cursor {
            Cursor::Page(page) => page,
            Cursor::Exhausted => return Ok(None),
        };

        let result = self.api.list_repository_events(self.repo, page).await;
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                self.cursor = Cursor::Exhausted;
                return Err(e);
            }
        };

        self.stats.pages += 1;
        self.cursor = match fetched.next_page {
            Some(next) if next > page => Cursor::Page(next),
            Some(next) => {
                warn!(repo = %self.repo, page, next, "Feed pagination did not advance, stopping");
                Cursor::Exhausted
            }
            None => Cursor::Exhausted,
        };

        let mut events = Vec::with_capacity(fetched.items.len());
        for raw in &fetched.items {
            match decode_activity(raw) {
                Ok(record) => {
                    self.stats.records += 1;
                    if let Some(at) = record.created_at {
                        self.stats.oldest = Some(self.stats.oldest.map_or(at, |o| o.min(at)));
                    }
                    events.push(record.event);
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    warn!(
                        repo = %self.repo,
                        event_id = raw.get("id").and_then(|v| v.as_str()).unwrap_or("?"),
                        error = %e,
                        "Skipping malformed activity record"
                    );
                }
            }
        }

        debug!(
            repo = %self.repo,
            page,
            decoded = events.len(),
            "Read activity page"
        );

        Ok(Some(events))
    }

    /// Returns what has been read so far.
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Consumes the reader, returning its final statistics.
    pub fn into_stats(self) -> FeedStats {
        self.stats
    }
}
