//! GitHub API error types.
//!
//! The audit treats every API failure the same way: the unit of work that
//! needed the call (a repository cycle, or one escalation) is abandoned and
//! the next cycle tries again. The error therefore only needs to say which
//! operation failed and why.

use thiserror::Error;

/// A failed GitHub API call.
#[derive(Debug, Error)]
pub enum GitHubApiError {
    /// The request failed in transport, returned an error status, or its
    /// body could not be deserialized.
    #[error("GitHub API {operation} failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: octocrab::Error,
    },

    /// The operation could not be performed, without an octocrab error to
    /// attach (used by non-HTTP implementations of the API).
    #[error("GitHub API {operation} unavailable: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },
}

impl GitHubApiError {
    /// Wraps an octocrab error for the named operation.
    pub fn request(operation: &'static str, source: octocrab::Error) -> Self {
        GitHubApiError::Request { operation, source }
    }

    /// Creates an error without an underlying octocrab error.
    pub fn unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        GitHubApiError::Unavailable {
            operation,
            message: message.into(),
        }
    }

    /// Returns the name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            GitHubApiError::Request { operation, .. } => operation,
            GitHubApiError::Unavailable { operation, .. } => operation,
        }
    }
}
