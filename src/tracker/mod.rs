//! Issue-tracker services
//!
//! Provides a capability interface for ticket lookups so the evaluator can
//! run against Jira in production and deterministic fakes in tests.

mod jira;
mod key;

pub use jira::{JiraCredentials, JiraService};
pub use key::{DEFAULT_KEY_PATTERN, KeySource, TicketKeyPattern};

use crate::error::{Error, Result};
use crate::types::Ticket;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Issue-tracker operations needed by the evaluator
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch a ticket by key, including the requested extra fields
    ///
    /// Fails with [`Error::NotFound`] when the key is malformed or absent.
    async fn fetch_ticket(&self, key: &str, fields: &[String]) -> Result<Ticket>;

    /// Keys approved by a release approval ticket
    ///
    /// The set holds `key` itself, every issue linked to it in either
    /// direction, and its subtasks. Fails with [`Error::NotFound`] when the
    /// approval ticket does not exist.
    async fn fetch_linked_keys(&self, key: &str) -> Result<BTreeSet<String>>;
}

/// Tracker used when no credentials were provided
///
/// Every lookup fails with a configuration error, so a rule that needs a
/// ticket surfaces as an infrastructure problem rather than a policy failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredTracker;

#[async_trait]
impl IssueTracker for UnconfiguredTracker {
    async fn fetch_ticket(&self, key: &str, _fields: &[String]) -> Result<Ticket> {
        Err(Error::Config(format!(
            "cannot look up {key}: issue tracker URL and credentials were not provided"
        )))
    }

    async fn fetch_linked_keys(&self, key: &str) -> Result<BTreeSet<String>> {
        self.fetch_ticket(key, &[]).await.map(|_| BTreeSet::new())
    }
}
