//! Config Resolver: restriction rules loaded from a TOML file
//!
//! Rules are kept in file order and scanned first-match-wins, so specific
//! patterns go before catch-alls. Loading is all-or-nothing: any unknown
//! field, bad glob, or empty requirement fails with [`Error::Config`].

mod pattern;

pub use pattern::BranchPattern;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::tracker::TicketKeyPattern;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Config path used when none is given (relative to the repository root)
pub const DEFAULT_CONFIG_PATH: &str = ".github/merge-gate.toml";

/// Kind of evidence a rule requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    /// Minimum number of distinct approving reviewers
    ApprovalCount,
    /// Linked ticket in an accepted status
    TicketStatus,
    /// Every commit ticket linked to a release approval ticket
    ApprovalTicket,
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApprovalCount => write!(f, "approvals"),
            Self::TicketStatus => write!(f, "ticket"),
            Self::ApprovalTicket => write!(f, "approval ticket"),
        }
    }
}

/// Approval requirement of a rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalRequirement {
    /// Minimum distinct approvers
    pub min: u32,
    /// Only approvers in this reviewer group count
    #[serde(default)]
    pub group: Option<String>,
}

/// Ticket requirement of a rule
///
/// `accepted_statuses` checks the first ticket key found on the PR.
/// `approval_ticket` checks every key in every commit message against the
/// tickets linked to (or subtasks of) that release ticket. Either or both
/// may be set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketRequirement {
    /// Ticket statuses that satisfy the rule, compared exactly
    #[serde(default)]
    pub accepted_statuses: Vec<String>,
    /// Ticket fields that must be present and non-null (status check only)
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Release approval ticket whose links approve commit tickets
    #[serde(default)]
    pub approval_ticket: Option<String>,
}

impl TicketRequirement {
    /// Whether the first linked ticket's status is checked
    pub fn checks_status(&self) -> bool {
        !self.accepted_statuses.is_empty()
    }
}

/// One restriction rule
#[derive(Debug, Clone)]
pub struct RestrictionRule {
    /// Display name (defaults to the branch pattern)
    pub name: String,
    /// Base branches this rule applies to
    pub pattern: BranchPattern,
    /// Approval requirement, if any
    pub approvals: Option<ApprovalRequirement>,
    /// Ticket requirement, if any
    pub ticket: Option<TicketRequirement>,
}

impl RestrictionRule {
    /// Whether this rule applies to `branch`
    pub fn matches(&self, branch: &str) -> bool {
        self.pattern.matches(branch)
    }

    /// Required evidence kinds, in evaluation order
    pub fn evidence(&self) -> Vec<EvidenceKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.approvals.is_some() {
            kinds.push(EvidenceKind::ApprovalCount);
        }
        if let Some(ref ticket) = self.ticket {
            if ticket.checks_status() {
                kinds.push(EvidenceKind::TicketStatus);
            }
            if ticket.approval_ticket.is_some() {
                kinds.push(EvidenceKind::ApprovalTicket);
            }
        }
        kinds
    }
}

/// Fully validated gate configuration
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    /// Rules in declaration order
    pub rules: Vec<RestrictionRule>,
    /// Ticket-key extraction pattern
    pub ticket_keys: TicketKeyPattern,
    /// Retry policy for upstream calls
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    ticket: RawTicketConfig,
    #[serde(default)]
    retry: RawRetryConfig,
    #[serde(default, rename = "rule")]
    rules: Vec<RawRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTicketConfig {
    pattern: Option<String>,
    #[serde(default)]
    projects: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRetryConfig {
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    name: Option<String>,
    branch: String,
    approvals: Option<ApprovalRequirement>,
    ticket: Option<TicketRequirement>,
}

impl RawRule {
    fn validate(self, index: usize) -> Result<RestrictionRule> {
        let pattern = BranchPattern::parse(&self.branch)
            .map_err(|e| Error::Config(format!("rule #{}: {}", index + 1, strip_prefix(&e))))?;
        let name = self.name.unwrap_or_else(|| self.branch.clone());
        let fail = |msg: &str| Error::Config(format!("rule '{name}': {msg}"));

        if self.approvals.is_none() && self.ticket.is_none() {
            return Err(fail("requires no evidence; add [rule.approvals] or [rule.ticket]"));
        }
        if let Some(ref approvals) = self.approvals {
            if approvals.min == 0 {
                return Err(fail("approvals.min must be at least 1"));
            }
            if approvals.group.as_deref().is_some_and(|g| g.trim().is_empty()) {
                return Err(fail("approvals.group must not be empty"));
            }
        }
        if let Some(ref ticket) = self.ticket {
            match ticket.approval_ticket.as_deref() {
                None if !ticket.checks_status() => {
                    return Err(fail(
                        "ticket needs accepted_statuses or approval_ticket",
                    ));
                }
                Some(key) if key.trim().is_empty() => {
                    return Err(fail("ticket.approval_ticket must not be empty"));
                }
                _ => {}
            }
            if !ticket.required_fields.is_empty() && !ticket.checks_status() {
                return Err(fail("ticket.required_fields needs ticket.accepted_statuses"));
            }
        }

        Ok(RestrictionRule {
            name,
            pattern,
            approvals: self.approvals,
            ticket: self.ticket,
        })
    }
}

fn strip_prefix(err: &Error) -> String {
    match err {
        Error::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

impl RawRetryConfig {
    fn validate(self) -> Result<RetryPolicy> {
        let defaults = RetryPolicy::default();
        let max_attempts = self.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(RetryPolicy {
            max_attempts,
            initial_delay: self
                .initial_delay_ms
                .map_or(defaults.initial_delay, Duration::from_millis),
            max_delay: self
                .max_delay_ms
                .map_or(defaults.max_delay, Duration::from_millis),
        })
    }
}

/// Parse and validate config text
pub fn parse_config(content: &str) -> Result<GateConfig> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| Error::Config(format!("malformed config: {e}")))?;

    let rules = raw
        .rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| rule.validate(index))
        .collect::<Result<Vec<_>>>()?;

    let ticket_keys = TicketKeyPattern::new(raw.ticket.pattern.as_deref(), raw.ticket.projects)?;
    let retry = raw.retry.validate()?;

    Ok(GateConfig {
        rules,
        ticket_keys,
        retry,
    })
}

/// Load and validate the config file at `path`
///
/// A missing file is an error: the gate never guesses which branches are
/// restricted.
pub fn load_config(path: &Path) -> Result<GateConfig> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "config file {} not found",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    parse_config(&content).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}
