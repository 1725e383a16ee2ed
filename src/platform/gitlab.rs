//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::http::{self, Upstream};
use crate::platform::{MAX_PAGES, PER_PAGE, SourceControl};
use crate::retry::Retry;
use crate::types::{PlatformConfig, PullRequest, Review, ReviewState};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    title: String,
    web_url: String,
    source_branch: String,
    target_branch: String,
    source_project_id: u64,
    target_project_id: u64,
}

/// MR approvals response
#[derive(Deserialize)]
struct MrApprovals {
    #[serde(default)]
    approved_by: Vec<Approver>,
}

#[derive(Deserialize)]
struct Approver {
    user: GlUser,
}

#[derive(Deserialize)]
struct GlUser {
    username: String,
}

#[derive(Deserialize)]
struct GlCommit {
    message: String,
}

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    config: PlatformConfig,
    project_path: String,
    retry: Retry,
}

impl GitLabService {
    /// Create a new GitLab service
    ///
    /// `config.api_url` is the v4 API root, e.g. `https://gitlab.com/api/v4`.
    pub fn new(config: PlatformConfig, token: &str, retry: Retry) -> Result<Self> {
        let project_path = config.slug();
        Ok(Self {
            client: http::build_client(Upstream::GitLab)?,
            token: token.to_string(),
            config,
            project_path,
            retry,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, page: Option<u32>, what: &str) -> Result<T> {
        let mut request = self.client.get(url).header("PRIVATE-TOKEN", &self.token);
        if let Some(page) = page {
            request = request.query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
        }
        http::get_json(Upstream::GitLab, request, what).await
    }

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
impl SourceControl for GitLabService {
    async fn fetch_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(mr_iid = pr_number, "fetching MR");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests/{}",
            self.encoded_project(),
            pr_number
        ));
        let what = format!("merge request !{pr_number}");

        let mr: MergeRequest = self.retry.run(&what, || self.get(&url, None, &what)).await?;

        let head_repo = if mr.source_project_id == mr.target_project_id {
            self.project_path.clone()
        } else {
            format!("project {}", mr.source_project_id)
        };
        let result = PullRequest {
            number: mr.iid,
            title: mr.title,
            base_ref: mr.target_branch,
            head_ref: mr.source_branch,
            head_repo,
            html_url: mr.web_url,
        };
        debug!(mr_iid = pr_number, base = %result.base_ref, "fetched MR");
        Ok(result)
    }

    async fn fetch_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        // GitLab keeps only the current approvals; revoking one removes it
        debug!(mr_iid = pr_number, "listing approvals");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests/{}/approvals",
            self.encoded_project(),
            pr_number
        ));
        let what = format!("approvals for merge request !{pr_number}");

        let approvals: MrApprovals = self.retry.run(&what, || self.get(&url, None, &what)).await?;
        let result: Vec<Review> = approvals
            .approved_by
            .into_iter()
            .map(|a| Review {
                reviewer: a.user.username,
                state: ReviewState::Approved,
                submitted_at: None,
            })
            .collect();
        debug!(mr_iid = pr_number, count = result.len(), "listed approvals");
        Ok(result)
    }

    async fn fetch_commit_messages(&self, pr_number: u64) -> Result<Vec<String>> {
        debug!(mr_iid = pr_number, "listing commits");
        let path = format!(
            "/projects/{}/merge_requests/{}/commits",
            self.encoded_project(),
            pr_number
        );
        let what = format!("commits for merge request !{pr_number}");

        let commits: Vec<GlCommit> = self.get_all(&path, &what).await?;
        debug!(mr_iid = pr_number, count = commits.len(), "listed commits");
        // GitLab lists newest first
        Ok(commits.into_iter().rev().map(|c| c.message).collect())
    }

    async fn fetch_group_members(&self, group: &str) -> Result<BTreeSet<String>> {
        debug!(group, "listing group members");
        let path = format!("/groups/{}/members/all", urlencoding::encode(group));
        let what = format!("members of group {group}");

        let members: Vec<GlUser> = self.get_all(&path, &what).await?;
        debug!(group, count = members.len(), "listed group members");
        Ok(members.into_iter().map(|m| m.username).collect())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
