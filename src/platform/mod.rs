//! Source-control services for GitHub and GitLab
//!
//! Provides a unified, read-only interface for the facts the merge gate
//! needs about a PR/MR.

mod approvals;
mod factory;
mod github;
mod gitlab;

pub use approvals::approvals_from_reviews;
pub use factory::{create_source_control, default_api_url, parse_repo_slug};
pub use github::GitHubService;
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{PlatformConfig, PullRequest, Review};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Page size used for paginated list endpoints
pub(crate) const PER_PAGE: usize = 100;

/// Upper bound on pages fetched for one list
pub(crate) const MAX_PAGES: u32 = 50;

/// Source-control operations needed by the evaluator
///
/// This trait abstracts GitHub and GitLab so the evaluator runs unchanged
/// against either platform, or against a fake in tests.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Fetch PR metadata
    ///
    /// Fails with `NotFound` if the PR does not exist.
    async fn fetch_pull_request(&self, pr_number: u64) -> Result<PullRequest>;

    /// List all submitted reviews on a PR, in the order the platform returns them
    async fn fetch_reviews(&self, pr_number: u64) -> Result<Vec<Review>>;

    /// Identities whose latest decisive review is an approval.
    ///
    /// Delegates to [`fetch_reviews`] and reduces with
    /// [`approvals_from_reviews`]. Implementors should override
    /// `fetch_reviews`, not this method.
    ///
    /// [`fetch_reviews`]: Self::fetch_reviews
    async fn fetch_approvals(&self, pr_number: u64) -> Result<BTreeSet<String>> {
        let reviews = self.fetch_reviews(pr_number).await?;
        Ok(approvals_from_reviews(&reviews))
    }

    /// Commit messages on a PR, oldest first
    async fn fetch_commit_messages(&self, pr_number: u64) -> Result<Vec<String>>;

    /// Members of a reviewer group (GitHub team slug or GitLab group path)
    async fn fetch_group_members(&self, group: &str) -> Result<BTreeSet<String>>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
