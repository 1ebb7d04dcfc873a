//! Octocrab client wrapper.
//!
//! Unlike a repository-scoped client, the audit reads from every monitored
//! repository and writes escalations to a separate tracking repository, so
//! the repository is passed per call instead of being fixed at construction.

use octocrab::Octocrab;

/// A GitHub API client backed by octocrab.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,
}

impl OctocrabClient {
    /// Creates a client around an already-configured octocrab instance,
    /// such as a GitHub App installation client.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates a client from a GitHub token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient").finish_non_exhaustive()
    }
}
