//! Policy Evaluator - the decision core
//!
//! Two-phase pattern:
//! 1. Gather - fetch the evidence the matched rule requires (effectful)
//! 2. Judge - decide PASS/FAIL and explain why (pure, testable)

mod evaluate;
mod judge;

pub use evaluate::evaluate;
pub use judge::{
    CheckResult, TicketLookup, assemble_verdict, judge_approval_links, judge_approvals, judge_ticket,
    match_rule,
};
