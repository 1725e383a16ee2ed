//! Reporter: turn a verdict (or a failure to reach one) into CI output
//!
//! Rendering is pure so that reruns against identical upstream data produce
//! byte-identical summaries.

use crate::error::Error;
use crate::types::{Outcome, Verdict};
use std::fmt::Write;

/// Exit status for a passing check
pub const EXIT_PASS: i32 = 0;
/// Exit status for a policy violation
pub const EXIT_FAIL: i32 = 1;
/// Exit status when the outcome could not be determined
pub const EXIT_ERROR: i32 = 2;

/// Machine- and human-readable result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Process exit status
    pub exit_code: i32,
    /// Value for the CI output variable (`pass`, `fail`, or `error`)
    pub status: &'static str,
    /// Markdown summary for display on the PR
    pub summary: String,
}

impl Report {
    /// Whether the orchestration layer should allow the merge
    pub const fn allows_merge(&self) -> bool {
        self.exit_code == EXIT_PASS
    }
}

/// Render a verdict
pub fn render(verdict: &Verdict) -> Report {
    let mut summary = format!("## Merge gate: {}\n\n", verdict.outcome);

    match (&verdict.matched_rule, verdict.outcome) {
        (None, _) => {}
        (Some(rule), Outcome::Pass) => {
            let _ = writeln!(summary, "All requirements of rule `{rule}` are met.\n");
        }
        (Some(rule), Outcome::Fail) => {
            let _ = writeln!(
                summary,
                "This pull request does not meet the requirements of rule `{rule}`.\n"
            );
        }
    }

    for reason in &verdict.reasons {
        let _ = writeln!(summary, "- {reason}");
    }

    let (exit_code, status) = match verdict.outcome {
        Outcome::Pass => (EXIT_PASS, "pass"),
        Outcome::Fail => (EXIT_FAIL, "fail"),
    };

    Report {
        exit_code,
        status,
        summary,
    }
}

/// Render a failure to evaluate
///
/// Worded as an infrastructure problem so the PR author is not told their
/// change violates policy when the checker itself is broken.
pub fn render_error(error: &Error) -> Report {
    let kind = match error {
        Error::Config(_) => "The merge gate configuration is invalid.",
        Error::Timeout(_) => "The merge gate did not finish in time.",
        _ => "The merge gate could not determine whether this pull request meets policy.",
    };

    let summary = format!(
        "## Merge gate: ERROR\n\n\
         {kind} This is an infrastructure failure, not a policy violation; \
         operator attention is required.\n\n\
         - {error}\n"
    );

    Report {
        exit_code: EXIT_ERROR,
        status: "error",
        summary,
    }
}
