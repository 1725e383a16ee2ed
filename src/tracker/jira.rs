//! Jira issue-tracker service

use crate::error::{Error, Result};
use crate::http::{self, Upstream};
use crate::retry::Retry;
use crate::tracker::IssueTracker;
use crate::types::Ticket;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Shape of a Jira issue key
static ISSUE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*-[0-9]+$").expect("issue key regex is valid"));

/// Connection details for Jira
#[derive(Clone)]
pub struct JiraCredentials {
    /// Base URL of the Jira instance (e.g., `https://example.atlassian.net`)
    pub base_url: String,
    /// Account username or email
    pub username: String,
    /// API token
    pub api_token: String,
}

impl std::fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct IssueResponse {
    key: String,
    fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct LinksResponse {
    key: String,
    fields: LinkFields,
}

#[derive(Deserialize)]
struct LinkFields {
    #[serde(default, rename = "issuelinks")]
    issue_links: Vec<IssueLink>,
    #[serde(default)]
    subtasks: Vec<IssueRef>,
}

/// One link; exactly one side is present, depending on direction
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueLink {
    inward_issue: Option<IssueRef>,
    outward_issue: Option<IssueRef>,
}

#[derive(Deserialize)]
struct IssueRef {
    key: String,
}

/// Jira service using reqwest
pub struct JiraService {
    client: Client,
    base_url: Url,
    username: String,
    api_token: String,
    retry: Retry,
}

impl JiraService {
    /// Create a new Jira service
    pub fn new(credentials: JiraCredentials, retry: Retry) -> Result<Self> {
        let mut base_url = Url::parse(&credentials.base_url).map_err(|e| {
            Error::Config(format!(
                "invalid issue tracker URL '{}': {e}",
                credentials.base_url
            ))
        })?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: http::build_client(Upstream::Tracker)?,
            base_url,
            username: credentials.username,
            api_token: credentials.api_token,
            retry,
        })
    }

    fn issue_url(&self, key: &str) -> Result<Url> {
        self.base_url
            .join(&format!("rest/api/2/issue/{}", urlencoding::encode(key)))
            .map_err(|e| Error::TrackerApi(format!("failed to build issue URL: {e}")))
    }

    async fn get_issue<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        field_list: &str,
        what: &str,
    ) -> Result<T> {
        let request = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.api_token))
            .header("Accept", "application/json")
            .query(&[("fields", field_list)]);
        http::get_json(Upstream::Tracker, request, what).await
    }
}

#[async_trait]
impl IssueTracker for JiraService {
    async fn fetch_ticket(&self, key: &str, fields: &[String]) -> Result<Ticket> {
        debug!(key, "fetching ticket");
        if !ISSUE_KEY.is_match(key) {
            return Err(Error::NotFound(format!("malformed ticket key '{key}'")));
        }

        let url = self.issue_url(key)?;
        let field_list = std::iter::once("status")
            .chain(fields.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",");
        let what = format!("ticket {key}");

        let issue: IssueResponse = self
            .retry
            .run(&what, || self.get_issue(&url, &field_list, &what))
            .await?;

        let status = issue
            .fields
            .get("status")
            .and_then(|s| s.get("name"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::TrackerApi(format!("ticket {key} has no status")))?
            .to_string();

        let extra: BTreeMap<String, serde_json::Value> = fields
            .iter()
            .filter_map(|name| {
                issue
                    .fields
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect();

        debug!(key = %issue.key, status = %status, "fetched ticket");
        Ok(Ticket {
            key: issue.key,
            status,
            fields: extra,
        })
    }

    async fn fetch_linked_keys(&self, key: &str) -> Result<BTreeSet<String>> {
        debug!(key, "fetching approval ticket links");
        if !ISSUE_KEY.is_match(key) {
            return Err(Error::NotFound(format!("malformed ticket key '{key}'")));
        }

        let url = self.issue_url(key)?;
        let what = format!("approval ticket {key}");

        let issue: LinksResponse = self
            .retry
            .run(&what, || self.get_issue(&url, "issuelinks,subtasks", &what))
            .await?;

        let mut approved: BTreeSet<String> = issue
            .fields
            .issue_links
            .into_iter()
            .flat_map(|link| [link.inward_issue, link.outward_issue])
            .flatten()
            .chain(issue.fields.subtasks)
            .map(|linked| linked.key)
            .collect();
        // A moved issue answers under its new key; keep both
        approved.insert(issue.key);
        approved.insert(key.to_string());

        debug!(key, count = approved.len(), "fetched approval ticket links");
        Ok(approved)
    }
}
