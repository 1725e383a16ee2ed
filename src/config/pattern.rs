//! Branch patterns: exact names or globs

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};

/// Characters that turn a pattern into a glob
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Pattern matching one or more base branch names
///
/// A pattern with no glob metacharacters matches only that exact branch.
/// Otherwise it is a glob where `*` stays within one `/`-separated segment
/// and `**` crosses segments.
#[derive(Debug, Clone)]
pub enum BranchPattern {
    /// Exact branch name
    Exact(String),
    /// Compiled glob
    Glob {
        /// Pattern as written in the config
        source: String,
        /// Compiled matcher
        matcher: GlobMatcher,
    },
}

impl BranchPattern {
    /// Parse a pattern from config text
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(Error::Config("branch pattern must not be empty".to_string()));
        }

        if !pattern.contains(GLOB_META) {
            return Ok(Self::Exact(pattern.to_string()));
        }

        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::Config(format!("invalid branch glob '{pattern}': {e}")))?
            .compile_matcher();

        Ok(Self::Glob {
            source: pattern.to_string(),
            matcher,
        })
    }

    /// Whether `branch` matches this pattern
    pub fn matches(&self, branch: &str) -> bool {
        match self {
            Self::Exact(name) => name == branch,
            Self::Glob { matcher, .. } => matcher.is_match(branch),
        }
    }

    /// Pattern as written in the config
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(name) => name,
            Self::Glob { source, .. } => source,
        }
    }
}

impl std::fmt::Display for BranchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
