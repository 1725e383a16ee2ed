//! Policy evaluation - effectful evidence gathering
//!
//! Matches the PR against the rules, fetches only the evidence the matched
//! rule needs, and delegates the decision to the pure functions in
//! [`judge`](super::judge). Any failure to fetch evidence becomes
//! [`Error::Evaluation`] rather than a FAIL verdict.

use crate::config::{ApprovalRequirement, RestrictionRule, TicketRequirement};
use crate::error::{Error, Result};
use crate::platform::SourceControl;
use crate::policy::judge::{
    CheckResult, TicketLookup, assemble_verdict, judge_approval_links, judge_approvals,
    judge_ticket, match_rule,
};
use crate::tracker::{IssueTracker, TicketKeyPattern};
use crate::types::{PullRequest, Verdict};
use tracing::{debug, info};

/// Evaluate a PR against the restriction rules
///
/// Stateless: the same upstream responses always produce the same verdict.
/// An unrestricted base branch passes without any further upstream calls.
pub async fn evaluate(
    pr: &PullRequest,
    rules: &[RestrictionRule],
    ticket_keys: &TicketKeyPattern,
    source_control: &dyn SourceControl,
    tracker: &dyn IssueTracker,
) -> Result<Verdict> {
    let Some(rule) = match_rule(rules, &pr.base_ref) else {
        info!(pr = pr.number, base = %pr.base_ref, "branch not restricted");
        return Ok(Verdict::unrestricted());
    };
    info!(
        pr = pr.number,
        base = %pr.base_ref,
        rule = %rule.name,
        pattern = %rule.pattern,
        "matched restriction rule"
    );

    let mut commits = CommitMessages::default();
    let mut checks = Vec::with_capacity(3);
    if let Some(ref requirement) = rule.approvals {
        checks.push(check_approvals(pr, requirement, source_control).await?);
    }
    if let Some(ref requirement) = rule.ticket {
        if requirement.checks_status() {
            checks.push(
                check_ticket(pr, requirement, ticket_keys, &mut commits, source_control, tracker)
                    .await?,
            );
        }
        if let Some(ref approval_ticket) = requirement.approval_ticket {
            checks.push(
                check_approval_ticket(
                    pr,
                    approval_ticket,
                    ticket_keys,
                    &mut commits,
                    source_control,
                    tracker,
                )
                .await?,
            );
        }
    }

    for check in &checks {
        debug!(kind = %check.kind, passed = check.passed, reason = %check.reason, "sub-check");
    }

    let verdict = assemble_verdict(rule, &checks);
    info!(pr = pr.number, outcome = %verdict.outcome, "evaluated policy");
    Ok(verdict)
}

/// Commit messages, fetched at most once per evaluation
#[derive(Default)]
struct CommitMessages(Option<Vec<String>>);

impl CommitMessages {
    async fn get(
        &mut self,
        pr: &PullRequest,
        source_control: &dyn SourceControl,
    ) -> Result<&[String]> {
        if self.0.is_none() {
            let messages = source_control
                .fetch_commit_messages(pr.number)
                .await
                .map_err(|e| Error::evaluation("fetching commit messages", e))?;
            debug!(pr = pr.number, count = messages.len(), "fetched commit messages");
            self.0 = Some(messages);
        }
        Ok(self.0.as_deref().unwrap_or_default())
    }
}

async fn check_approvals(
    pr: &PullRequest,
    requirement: &ApprovalRequirement,
    source_control: &dyn SourceControl,
) -> Result<CheckResult> {
    let approvers = source_control
        .fetch_approvals(pr.number)
        .await
        .map_err(|e| Error::evaluation("fetching approvals", e))?;
    debug!(pr = pr.number, ?approvers, "approving reviewers");

    let members = match requirement.group {
        Some(ref group) => Some(
            source_control
                .fetch_group_members(group)
                .await
                .map_err(|e| Error::evaluation(format!("fetching members of group '{group}'"), e))?,
        ),
        None => None,
    };

    Ok(judge_approvals(requirement, &approvers, members.as_ref()))
}

async fn check_ticket(
    pr: &PullRequest,
    requirement: &TicketRequirement,
    ticket_keys: &TicketKeyPattern,
    commits: &mut CommitMessages,
    source_control: &dyn SourceControl,
    tracker: &dyn IssueTracker,
) -> Result<CheckResult> {
    let found = match ticket_keys.extract_from_pr(&pr.title, &pr.head_ref) {
        Some(found) => Some(found),
        None => {
            let messages = commits.get(pr, source_control).await?;
            ticket_keys.extract_from_commits(messages.iter().map(String::as_str))
        }
    };

    let lookup = match found {
        None => {
            debug!(pr = pr.number, "no ticket key found");
            TicketLookup::NoKey
        }
        Some((key, source)) => {
            debug!(pr = pr.number, key = %key, %source, "found ticket key");
            match tracker.fetch_ticket(&key, &requirement.required_fields).await {
                Ok(ticket) => TicketLookup::Found(ticket),
                // A key pointing nowhere is the author's problem, not the gate's
                Err(e) if e.is_not_found() => TicketLookup::Missing(key),
                Err(e) => return Err(Error::evaluation(format!("fetching ticket {key}"), e)),
            }
        }
    };

    Ok(judge_ticket(requirement, &lookup))
}

async fn check_approval_ticket(
    pr: &PullRequest,
    approval_ticket: &str,
    ticket_keys: &TicketKeyPattern,
    commits: &mut CommitMessages,
    source_control: &dyn SourceControl,
    tracker: &dyn IssueTracker,
) -> Result<CheckResult> {
    let messages = commits.get(pr, source_control).await?;
    let commit_keys = ticket_keys.extract_all_from_commits(messages.iter().map(String::as_str));
    debug!(pr = pr.number, ?commit_keys, "ticket keys in commits");
    if commit_keys.is_empty() {
        return Ok(judge_approval_links(approval_ticket, &commit_keys, None));
    }

    let approved = match tracker.fetch_linked_keys(approval_ticket).await {
        Ok(approved) => Some(approved),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            return Err(Error::evaluation(
                format!("fetching approval ticket {approval_ticket}"),
                e,
            ));
        }
    };

    Ok(judge_approval_links(approval_ticket, &commit_keys, approved.as_ref()))
}
