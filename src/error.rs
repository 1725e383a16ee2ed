//! Error types for merge-gate
//!
//! The taxonomy separates "the PR does not meet policy" (a [`Verdict`] with
//! outcome FAIL, not an error at all) from "the gate could not decide"
//! (every variant here).
//!
//! [`Verdict`]: crate::types::Verdict

use std::time::Duration;
use thiserror::Error;

/// Errors raised by merge-gate
#[derive(Debug, Error)]
pub enum Error {
    /// Restriction rules missing or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// PR, ticket, or other resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials rejected by an upstream service
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network failure or server-side error; safe to retry
    #[error("transient failure: {0}")]
    Transient(String),

    /// Unexpected response from the GitHub API
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Unexpected response from the GitLab API
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Unexpected response from the issue tracker
    #[error("issue tracker error: {0}")]
    TrackerApi(String),

    /// Policy outcome could not be determined
    #[error("could not determine policy outcome while {step}: {source}")]
    Evaluation {
        /// What the evaluator was doing when it failed
        step: String,
        /// Underlying failure
        #[source]
        source: Box<Self>,
    },

    /// Whole check exceeded its time budget
    #[error("check timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant broken
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a fetch failure as an evaluation error for the given step
    pub fn evaluation(step: impl Into<String>, source: Self) -> Self {
        Self::Evaluation {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Whether retrying the same call may succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether this is a missing-resource error
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for merge-gate operations
pub type Result<T> = std::result::Result<T, Error>;
