//! Policy judgement - pure functions over gathered evidence
//!
//! No I/O happens here: the evaluator fetches approvals and tickets, then
//! hands them to these functions. Everything that decides PASS or FAIL, and
//! every reason string a PR author sees, lives in this module.

use crate::config::{ApprovalRequirement, EvidenceKind, RestrictionRule, TicketRequirement};
use crate::types::{Outcome, Ticket, Verdict};
use std::collections::BTreeSet;

/// Result of one sub-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Evidence kind that was checked
    pub kind: EvidenceKind,
    /// Whether the requirement holds
    pub passed: bool,
    /// Explanation shown to the PR author
    pub reason: String,
}

/// Outcome of looking up the PR's linked ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketLookup {
    /// No ticket key in title, branch name, or commits
    NoKey,
    /// Key extracted but the tracker has no such ticket
    Missing(String),
    /// Ticket fetched
    Found(Ticket),
}

/// First rule whose pattern matches `branch`, in declaration order
pub fn match_rule<'a>(rules: &'a [RestrictionRule], branch: &str) -> Option<&'a RestrictionRule> {
    rules.iter().find(|rule| rule.matches(branch))
}

/// Judge the approval requirement
///
/// `group_members` restricts which approvers count; pass `None` when the
/// requirement names no group.
pub fn judge_approvals(
    requirement: &ApprovalRequirement,
    approvers: &BTreeSet<String>,
    group_members: Option<&BTreeSet<String>>,
) -> CheckResult {
    let count = group_members.map_or(approvers.len(), |members| {
        approvers.intersection(members).count()
    });
    let min = requirement.min;
    let passed = count >= min as usize;

    let reason = match requirement.group {
        Some(ref group) => format!("{count}/{min} required approvals from group '{group}' present"),
        None => format!("{count}/{min} required approvals present"),
    };

    CheckResult {
        kind: EvidenceKind::ApprovalCount,
        passed,
        reason,
    }
}

/// Judge the ticket requirement
pub fn judge_ticket(requirement: &TicketRequirement, lookup: &TicketLookup) -> CheckResult {
    let (passed, reason) = match lookup {
        TicketLookup::NoKey => (false, "no linked ticket found".to_string()),
        TicketLookup::Missing(key) => (false, format!("linked ticket {key} not found")),
        TicketLookup::Found(ticket) => judge_found_ticket(requirement, ticket),
    };

    CheckResult {
        kind: EvidenceKind::TicketStatus,
        passed,
        reason,
    }
}

fn judge_found_ticket(requirement: &TicketRequirement, ticket: &Ticket) -> (bool, String) {
    if !requirement.accepted_statuses.contains(&ticket.status) {
        let accepted = requirement
            .accepted_statuses
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return (
            false,
            format!(
                "ticket {} status '{}' not in accepted set {{{accepted}}}",
                ticket.key, ticket.status
            ),
        );
    }

    let missing: Vec<String> = requirement
        .required_fields
        .iter()
        .filter(|field| ticket.fields.get(*field).is_none_or(serde_json::Value::is_null))
        .map(|field| format!("'{field}'"))
        .collect();
    if !missing.is_empty() {
        return (
            false,
            format!(
                "ticket {} missing required field(s) {}",
                ticket.key,
                missing.join(", ")
            ),
        );
    }

    (
        true,
        format!("ticket {} status '{}' accepted", ticket.key, ticket.status),
    )
}

/// Judge commit tickets against a release approval ticket
///
/// `approved` is the approval ticket plus everything linked to it or filed
/// as its subtask; `None` means the approval ticket itself does not exist.
/// Every key in `commit_keys` must be approved.
pub fn judge_approval_links(
    approval_ticket: &str,
    commit_keys: &BTreeSet<String>,
    approved: Option<&BTreeSet<String>>,
) -> CheckResult {
    let (passed, reason) = match approved {
        _ if commit_keys.is_empty() => (false, "no linked ticket found".to_string()),
        None => (false, format!("approval ticket {approval_ticket} not found")),
        Some(approved) => {
            let unapproved: Vec<&str> = commit_keys
                .iter()
                .filter(|key| !approved.contains(*key))
                .map(String::as_str)
                .collect();
            if unapproved.is_empty() {
                (
                    true,
                    format!(
                        "{} commit ticket(s) linked to approval ticket {approval_ticket}",
                        commit_keys.len()
                    ),
                )
            } else {
                (
                    false,
                    format!(
                        "ticket(s) {} not linked to approval ticket {approval_ticket}; \
                         link them there before merging",
                        unapproved.join(", ")
                    ),
                )
            }
        }
    };

    CheckResult {
        kind: EvidenceKind::ApprovalTicket,
        passed,
        reason,
    }
}

/// Combine sub-check results into the final verdict (logical AND)
pub fn assemble_verdict(rule: &RestrictionRule, checks: &[CheckResult]) -> Verdict {
    let outcome = if checks.iter().all(|c| c.passed) {
        Outcome::Pass
    } else {
        Outcome::Fail
    };

    Verdict {
        outcome,
        reasons: checks.iter().map(|c| c.reason.clone()).collect(),
        matched_rule: Some(rule.name.clone()),
    }
}
