//! Mock source-control and issue-tracker services for testing

#![allow(dead_code)]

use async_trait::async_trait;
use merge_gate::error::{Error, Result};
use merge_gate::platform::SourceControl;
use merge_gate::tracker::IssueTracker;
use merge_gate::types::{PlatformConfig, PullRequest, Review, Ticket};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// Kind of failure to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Credentials rejected
    Auth,
    /// Upstream unreachable after retries
    Transient,
    /// Resource missing
    NotFound,
}

impl Failure {
    fn to_error(self, what: &str) -> Error {
        match self {
            Self::Auth => Error::Auth(format!("{what}: 401 Unauthorized")),
            Self::Transient => Error::Transient(format!("{what}: 503 Service Unavailable")),
            Self::NotFound => Error::NotFound(what.to_string()),
        }
    }
}

/// Mock source-control service
///
/// Features:
/// - Configurable PR, reviews, commits, and group members
/// - Call tracking for verification
/// - Error injection per operation
pub struct MockSourceControl {
    config: PlatformConfig,
    pull_request: Mutex<Option<PullRequest>>,
    reviews: Mutex<Vec<Review>>,
    commits: Mutex<Vec<String>>,
    groups: Mutex<HashMap<String, BTreeSet<String>>>,
    // Call tracking
    fetch_pr_calls: Mutex<Vec<u64>>,
    fetch_reviews_calls: Mutex<Vec<u64>>,
    fetch_commits_calls: Mutex<Vec<u64>>,
    fetch_group_calls: Mutex<Vec<String>>,
    // Error injection
    error_on_fetch_pr: Mutex<Option<Failure>>,
    error_on_fetch_reviews: Mutex<Option<Failure>>,
    error_on_fetch_commits: Mutex<Option<Failure>>,
    error_on_fetch_group: Mutex<Option<Failure>>,
}

impl MockSourceControl {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            pull_request: Mutex::new(None),
            reviews: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            groups: Mutex::new(HashMap::new()),
            fetch_pr_calls: Mutex::new(Vec::new()),
            fetch_reviews_calls: Mutex::new(Vec::new()),
            fetch_commits_calls: Mutex::new(Vec::new()),
            fetch_group_calls: Mutex::new(Vec::new()),
            error_on_fetch_pr: Mutex::new(None),
            error_on_fetch_reviews: Mutex::new(None),
            error_on_fetch_commits: Mutex::new(None),
            error_on_fetch_group: Mutex::new(None),
        }
    }

    // === Response setup ===

    /// Set the PR returned by `fetch_pull_request`
    pub fn set_pull_request(&self, pr: PullRequest) {
        *self.pull_request.lock().unwrap() = Some(pr);
    }

    /// Set the reviews returned by `fetch_reviews`
    pub fn set_reviews(&self, reviews: Vec<Review>) {
        *self.reviews.lock().unwrap() = reviews;
    }

    /// Set the commit messages returned by `fetch_commit_messages`
    pub fn set_commits(&self, messages: &[&str]) {
        *self.commits.lock().unwrap() = messages.iter().map(ToString::to_string).collect();
    }

    /// Set the members of a reviewer group
    pub fn set_group(&self, group: &str, members: &[&str]) {
        self.groups.lock().unwrap().insert(
            group.to_string(),
            members.iter().map(ToString::to_string).collect(),
        );
    }

    // === Error injection ===

    /// Make `fetch_pull_request` fail
    pub fn fail_fetch_pr(&self, failure: Failure) {
        *self.error_on_fetch_pr.lock().unwrap() = Some(failure);
    }

    /// Make `fetch_reviews` fail
    pub fn fail_fetch_reviews(&self, failure: Failure) {
        *self.error_on_fetch_reviews.lock().unwrap() = Some(failure);
    }

    /// Make `fetch_commit_messages` fail
    pub fn fail_fetch_commits(&self, failure: Failure) {
        *self.error_on_fetch_commits.lock().unwrap() = Some(failure);
    }

    /// Make `fetch_group_members` fail
    pub fn fail_fetch_group(&self, failure: Failure) {
        *self.error_on_fetch_group.lock().unwrap() = Some(failure);
    }

    // === Call verification ===

    /// PR numbers passed to `fetch_pull_request`
    pub fn fetch_pr_calls(&self) -> Vec<u64> {
        self.fetch_pr_calls.lock().unwrap().clone()
    }

    /// PR numbers passed to `fetch_reviews`
    pub fn fetch_reviews_calls(&self) -> Vec<u64> {
        self.fetch_reviews_calls.lock().unwrap().clone()
    }

    /// PR numbers passed to `fetch_commit_messages`
    pub fn fetch_commits_calls(&self) -> Vec<u64> {
        self.fetch_commits_calls.lock().unwrap().clone()
    }

    /// Groups passed to `fetch_group_members`
    pub fn fetch_group_calls(&self) -> Vec<String> {
        self.fetch_group_calls.lock().unwrap().clone()
    }

    /// Total number of upstream calls made
    pub fn total_calls(&self) -> usize {
        self.fetch_pr_calls.lock().unwrap().len()
            + self.fetch_reviews_calls.lock().unwrap().len()
            + self.fetch_commits_calls.lock().unwrap().len()
            + self.fetch_group_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceControl for MockSourceControl {
    async fn fetch_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        self.fetch_pr_calls.lock().unwrap().push(pr_number);
        if let Some(failure) = *self.error_on_fetch_pr.lock().unwrap() {
            return Err(failure.to_error(&format!("pull request #{pr_number}")));
        }
        self.pull_request
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::NotFound(format!("pull request #{pr_number}")))
    }

    async fn fetch_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        self.fetch_reviews_calls.lock().unwrap().push(pr_number);
        if let Some(failure) = *self.error_on_fetch_reviews.lock().unwrap() {
            return Err(failure.to_error(&format!("reviews for pull request #{pr_number}")));
        }
        Ok(self.reviews.lock().unwrap().clone())
    }

    async fn fetch_commit_messages(&self, pr_number: u64) -> Result<Vec<String>> {
        self.fetch_commits_calls.lock().unwrap().push(pr_number);
        if let Some(failure) = *self.error_on_fetch_commits.lock().unwrap() {
            return Err(failure.to_error(&format!("commits for pull request #{pr_number}")));
        }
        Ok(self.commits.lock().unwrap().clone())
    }

    async fn fetch_group_members(&self, group: &str) -> Result<BTreeSet<String>> {
        self.fetch_group_calls.lock().unwrap().push(group.to_string());
        if let Some(failure) = *self.error_on_fetch_group.lock().unwrap() {
            return Err(failure.to_error(&format!("members of group {group}")));
        }
        self.groups
            .lock()
            .unwrap()
            .get(group)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("members of group {group}")))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// Mock issue tracker
///
/// Unknown keys answer `NotFound`, like a real tracker.
pub struct MockIssueTracker {
    tickets: Mutex<HashMap<String, Ticket>>,
    links: Mutex<HashMap<String, BTreeSet<String>>>,
    fetch_calls: Mutex<Vec<String>>,
    fetch_links_calls: Mutex<Vec<String>>,
    error_on_fetch: Mutex<Option<Failure>>,
}

impl MockIssueTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            tickets: Mutex::new(HashMap::new()),
            links: Mutex::new(HashMap::new()),
            fetch_calls: Mutex::new(Vec::new()),
            fetch_links_calls: Mutex::new(Vec::new()),
            error_on_fetch: Mutex::new(None),
        }
    }

    /// Add a ticket
    pub fn add_ticket(&self, ticket: Ticket) {
        self.tickets
            .lock()
            .unwrap()
            .insert(ticket.key.clone(), ticket);
    }

    /// Add an approval ticket with the given linked issues and subtasks
    pub fn add_approval_ticket(&self, key: &str, linked: &[&str]) {
        let mut approved: BTreeSet<String> = linked.iter().map(ToString::to_string).collect();
        approved.insert(key.to_string());
        self.links.lock().unwrap().insert(key.to_string(), approved);
    }

    /// Make every lookup fail
    pub fn fail_fetch(&self, failure: Failure) {
        *self.error_on_fetch.lock().unwrap() = Some(failure);
    }

    /// Keys passed to `fetch_ticket`
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// Keys passed to `fetch_linked_keys`
    pub fn fetch_links_calls(&self) -> Vec<String> {
        self.fetch_links_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for MockIssueTracker {
    async fn fetch_ticket(&self, key: &str, _fields: &[String]) -> Result<Ticket> {
        self.fetch_calls.lock().unwrap().push(key.to_string());
        if let Some(failure) = *self.error_on_fetch.lock().unwrap() {
            return Err(failure.to_error(&format!("ticket {key}")));
        }
        self.tickets
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("ticket {key}")))
    }

    async fn fetch_linked_keys(&self, key: &str) -> Result<BTreeSet<String>> {
        self.fetch_links_calls.lock().unwrap().push(key.to_string());
        if let Some(failure) = *self.error_on_fetch.lock().unwrap() {
            return Err(failure.to_error(&format!("approval ticket {key}")));
        }
        self.links
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("approval ticket {key}")))
    }
}
