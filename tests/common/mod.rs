//! Shared test fixtures

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{Failure, MockIssueTracker, MockSourceControl};

use chrono::{TimeZone, Utc};
use merge_gate::config::{GateConfig, parse_config};
use merge_gate::types::{Platform, PlatformConfig, PullRequest, Review, ReviewState, Ticket};
use std::collections::BTreeMap;

/// Rules used by most evaluator tests
pub const STANDARD_RULES: &str = r#"
[[rule]]
name = "production"
branch = "main"

[rule.approvals]
min = 2

[rule.ticket]
accepted_statuses = ["Approved", "Ready for Release"]

[[rule]]
name = "release trains"
branch = "release/*"

[rule.approvals]
min = 1
"#;

/// Create a GitHub config for testing
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        platform: Platform::GitHub,
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        api_url: "https://api.github.com".to_string(),
    }
}

/// Parse rules, panicking on invalid test input
pub fn rules(toml: &str) -> GateConfig {
    parse_config(toml).expect("test config should parse")
}

/// Create a PR targeting `base`
pub fn make_pr(number: u64, title: &str, head: &str, base: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        head_repo: "acme/widgets".to_string(),
        html_url: format!("https://github.com/acme/widgets/pull/{number}"),
    }
}

/// Create a review submitted `minute` minutes into a fixed hour
pub fn review(reviewer: &str, state: ReviewState, minute: u32) -> Review {
    Review {
        reviewer: reviewer.to_string(),
        state,
        submitted_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).single(),
    }
}

/// Approvals from each named reviewer
pub fn approvals(reviewers: &[&str]) -> Vec<Review> {
    reviewers
        .iter()
        .enumerate()
        .map(|(i, r)| review(r, ReviewState::Approved, u32::try_from(i).unwrap_or(0)))
        .collect()
}

/// Create a ticket with the given status and no extra fields
pub fn make_ticket(key: &str, status: &str) -> Ticket {
    Ticket {
        key: key.to_string(),
        status: status.to_string(),
        fields: BTreeMap::new(),
    }
}
