//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::http::{self, Upstream};
use crate::platform::{MAX_PAGES, PER_PAGE, SourceControl};
use crate::retry::Retry;
use crate::types::{PlatformConfig, PullRequest, Review, ReviewState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Deserialize)]
struct GhPull {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    html_url: String,
    base: GhRef,
    head: GhHead,
}

#[derive(Deserialize)]
struct GhRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Deserialize)]
struct GhHead {
    #[serde(rename = "ref")]
    ref_field: String,
    repo: Option<GhRepo>,
}

#[derive(Deserialize)]
struct GhRepo {
    full_name: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhReview {
    user: Option<GhUser>,
    state: String,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct GhCommit {
    commit: GhCommitDetail,
}

#[derive(Deserialize)]
struct GhCommitDetail {
    message: String,
}

fn review_state(state: &str) -> ReviewState {
    match state {
        "APPROVED" => ReviewState::Approved,
        "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
        "DISMISSED" => ReviewState::Dismissed,
        "PENDING" => ReviewState::Pending,
        // COMMENTED and anything newer never changes approval state
        _ => ReviewState::Commented,
    }
}

/// GitHub service using the REST v3 API
pub struct GitHubService {
    client: Client,
    config: PlatformConfig,
    token: String,
    retry: Retry,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `config.api_url` selects github.com or a GitHub Enterprise host
    /// (`https://{host}/api/v3`).
    pub fn new(config: PlatformConfig, token: &str, retry: Retry) -> Result<Self> {
        Ok(Self {
            client: http::build_client(Upstream::GitHub)?,
            config,
            token: token.to_string(),
            retry,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn repo_path(&self) -> String {
        format!("/repos/{}/{}", self.config.owner, self.config.repo)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, page: Option<u32>, what: &str) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(page) = page {
            request = request.query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
        }
        http::get_json(Upstream::GitHub, request, what).await
    }

    /// Fetch every page of a list endpoint, each page retried independently
    async fn get_all<T: DeserializeOwned + Send>(&self, path: &str, what: &str) -> Result<Vec<T>> {
        let url = self.api_url(path);
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch: Vec<T> = self
                .retry
                .run(what, || self.get(&url, Some(page), what))
                .await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                return Ok(items);
            }
        }
        // A partial list could hide a revoking review or an unlinked commit
        Err(Error::Internal(format!(
            "{what}: more than {MAX_PAGES} pages of {PER_PAGE}, refusing to judge a truncated list"
        )))
    }
}

#[async_trait]
impl SourceControl for GitHubService {
    async fn fetch_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(pr_number, "fetching PR");
        let url = self.api_url(&format!("{}/pulls/{pr_number}", self.repo_path()));
        let what = format!("pull request #{pr_number}");

        let pr: GhPull = self.retry.run(&what, || self.get(&url, None, &what)).await?;

        let result = PullRequest {
            number: pr.number,
            title: pr.title,
            base_ref: pr.base.ref_field,
            head_ref: pr.head.ref_field,
            // Head repo is null when the fork has been deleted
            head_repo: pr
                .head
                .repo
                .map_or_else(|| "(deleted fork)".to_string(), |r| r.full_name),
            html_url: pr.html_url,
        };
        debug!(pr_number, base = %result.base_ref, head = %result.head_ref, "fetched PR");
        Ok(result)
    }

    async fn fetch_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        debug!(pr_number, "listing reviews");
        let path = format!("{}/pulls/{pr_number}/reviews", self.repo_path());
        let what = format!("reviews for pull request #{pr_number}");

        let reviews: Vec<GhReview> = self.get_all(&path, &what).await?;
        let result: Vec<Review> = reviews
            .into_iter()
            .filter_map(|r| {
                // Reviews from deleted accounts have no user
                let user = r.user?;
                Some(Review {
                    reviewer: user.login,
                    state: review_state(&r.state),
                    submitted_at: r.submitted_at,
                })
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed reviews");
        Ok(result)
    }

    async fn fetch_commit_messages(&self, pr_number: u64) -> Result<Vec<String>> {
        debug!(pr_number, "listing commits");
        let path = format!("{}/pulls/{pr_number}/commits", self.repo_path());
        let what = format!("commits for pull request #{pr_number}");

        let commits: Vec<GhCommit> = self.get_all(&path, &what).await?;
        debug!(pr_number, count = commits.len(), "listed commits");
        Ok(commits.into_iter().map(|c| c.commit.message).collect())
    }

    async fn fetch_group_members(&self, group: &str) -> Result<BTreeSet<String>> {
        // "org/team" names another org; a bare slug is a team in the repo owner's org
        let (org, team) = group
            .split_once('/')
            .unwrap_or((self.config.owner.as_str(), group));
        debug!(org, team, "listing team members");
        let path = format!("/orgs/{org}/teams/{team}/members");
        let what = format!("members of team {org}/{team}");

        let members: Vec<GhUser> = self.get_all(&path, &what).await?;
        debug!(org, team, count = members.len(), "listed team members");
        Ok(members.into_iter().map(|m| m.login).collect())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
