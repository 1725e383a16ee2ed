//! Ticket-key extraction from pull request text

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeSet;

/// Default ticket-key pattern: project key, dash, digits
pub const DEFAULT_KEY_PATTERN: &str = r"\b[A-Z][A-Z0-9_]+-[0-9]+\b";

/// Where a ticket key was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// PR title
    Title,
    /// Head branch name
    Branch,
    /// A commit message on the PR
    Commit,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Branch => write!(f, "branch name"),
            Self::Commit => write!(f, "commit message"),
        }
    }
}

/// Compiled ticket-key pattern with an optional project allow-list
#[derive(Debug, Clone)]
pub struct TicketKeyPattern {
    regex: Regex,
    projects: Vec<String>,
}

impl Default for TicketKeyPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_KEY_PATTERN).expect("default key pattern is valid"),
            projects: Vec::new(),
        }
    }
}

impl TicketKeyPattern {
    /// Compile a pattern; `None` uses [`DEFAULT_KEY_PATTERN`]
    ///
    /// An empty `projects` list accepts any project.
    pub fn new(pattern: Option<&str>, projects: Vec<String>) -> Result<Self> {
        let source = pattern.unwrap_or(DEFAULT_KEY_PATTERN);
        let regex = Regex::new(source)
            .map_err(|e| Error::Config(format!("invalid ticket pattern '{source}': {e}")))?;
        Ok(Self { regex, projects })
    }

    /// First allowed key in `text`, scanning left to right
    pub fn find_in(&self, text: &str) -> Option<String> {
        self.regex
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|key| self.project_allowed(key))
            .map(ToString::to_string)
    }

    /// Every allowed key in `text`, in order of appearance
    pub fn find_all_in<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.regex
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|key| self.project_allowed(key))
    }

    /// Every distinct allowed key across all commit messages
    pub fn extract_all_from_commits<'a, I>(&self, commits: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        commits
            .into_iter()
            .flat_map(|message| self.find_all_in(message))
            .map(ToString::to_string)
            .collect()
    }

    /// Scan title, then branch, then commits; first match wins
    ///
    /// Callers that fetch commits over the network should use
    /// [`extract_from_pr`](Self::extract_from_pr) first and only fetch
    /// commits when it finds nothing.
    pub fn extract<'a, I>(&self, title: &str, branch: &str, commits: I) -> Option<(String, KeySource)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.extract_from_pr(title, branch)
            .or_else(|| self.extract_from_commits(commits))
    }

    /// Scan the title, then the branch name
    pub fn extract_from_pr(&self, title: &str, branch: &str) -> Option<(String, KeySource)> {
        if let Some(key) = self.find_in(title) {
            return Some((key, KeySource::Title));
        }
        self.find_in(branch).map(|key| (key, KeySource::Branch))
    }

    /// Scan commit messages in order
    pub fn extract_from_commits<'a, I>(&self, commits: I) -> Option<(String, KeySource)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        commits
            .into_iter()
            .find_map(|message| self.find_in(message))
            .map(|key| (key, KeySource::Commit))
    }

    fn project_allowed(&self, key: &str) -> bool {
        if self.projects.is_empty() {
            return true;
        }
        key.rsplit_once('-')
            .is_some_and(|(project, _)| self.projects.iter().any(|p| p == project))
    }
}
