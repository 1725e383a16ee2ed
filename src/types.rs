//! Core types for merge-gate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pull request / merge request, fetched once per check run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// PR/MR title
    pub title: String,
    /// Base branch name (merge target)
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// Repository the head branch lives in (`owner/name`)
    pub head_repo: String,
    /// Web URL for the PR/MR
    pub html_url: String,
}

/// State of a single submitted review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    /// Reviewer approved the change
    Approved,
    /// Reviewer asked for changes
    ChangesRequested,
    /// Comment-only review
    Commented,
    /// Review was dismissed
    Dismissed,
    /// Review not yet submitted
    Pending,
}

impl ReviewState {
    /// Whether this state replaces the reviewer's previous verdict
    pub const fn is_decisive(self) -> bool {
        matches!(
            self,
            Self::Approved | Self::ChangesRequested | Self::Dismissed
        )
    }
}

/// A review submitted on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer identity (login/username)
    pub reviewer: String,
    /// Review state
    pub state: ReviewState,
    /// When the review was submitted (None for pending reviews)
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An issue-tracker ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket key (e.g., "PROJ-42")
    pub key: String,
    /// Workflow status name (e.g., "Approved")
    pub status: String,
    /// Additional fields requested for release gating, by field id
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Source-control hosting platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    #[value(name = "github")]
    GitHub,
    /// GitLab or self-hosted GitLab
    #[value(name = "gitlab")]
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Platform type
    pub platform: Platform,
    /// Repository owner (user, organization, or group path)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// API base URL (e.g., `https://api.github.com`)
    pub api_url: String,
}

impl PlatformConfig {
    /// Full `owner/repo` slug
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Overall outcome of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// PR may merge
    Pass,
    /// PR violates policy
    Fail,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Terminal result of one evaluation run
///
/// Built once by the evaluator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Pass or fail
    pub outcome: Outcome,
    /// One explanation per sub-check, in evaluation order
    pub reasons: Vec<String>,
    /// Name of the matched rule (None when the branch is unrestricted)
    pub matched_rule: Option<String>,
}

impl Verdict {
    /// Verdict for a branch no rule applies to
    pub fn unrestricted() -> Self {
        Self {
            outcome: Outcome::Pass,
            reasons: vec!["unrestricted branch".to_string()],
            matched_rule: None,
        }
    }

    /// Whether the PR may merge
    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}
