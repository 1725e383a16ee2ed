//! Platform service construction

use crate::error::{Error, Result};
use crate::platform::{GitHubService, GitLabService, SourceControl};
use crate::retry::Retry;
use crate::types::{Platform, PlatformConfig};

/// Default API base URL for a platform
pub const fn default_api_url(platform: Platform) -> &'static str {
    match platform {
        Platform::GitHub => "https://api.github.com",
        Platform::GitLab => "https://gitlab.com/api/v4",
    }
}

/// Split an `owner/name` repository slug
///
/// The owner may contain further slashes (GitLab subgroups); the name is the
/// final segment.
pub fn parse_repo_slug(slug: &str) -> Result<(String, String)> {
    let slug = slug.trim().trim_end_matches(".git").trim_matches('/');
    match slug.rsplit_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::Config(format!(
            "invalid repository '{slug}': expected 'owner/name'"
        ))),
    }
}

/// Create the source-control service for a platform
pub fn create_source_control(
    config: PlatformConfig,
    token: &str,
    retry: Retry,
) -> Result<Box<dyn SourceControl>> {
    match config.platform {
        Platform::GitHub => Ok(Box::new(GitHubService::new(config, token, retry)?)),
        Platform::GitLab => Ok(Box::new(GitLabService::new(config, token, retry)?)),
    }
}
