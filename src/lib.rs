//! merge-gate - policy check for pull requests targeting restricted branches
//!
//! Decides whether a pull request may merge based on reviewer approvals and
//! linked issue-tracker ticket status, and reports a single verdict.
//!
//! The flow is: fetch the PR ([`platform`]), match it against the configured
//! restriction rules ([`config`]), gather the evidence the matched rule
//! requires ([`platform`], [`tracker`]), judge it ([`policy`]) and render the
//! result ([`report`]).

pub mod config;
pub mod error;
pub mod http;
pub mod platform;
pub mod policy;
pub mod report;
pub mod retry;
pub mod tracker;
pub mod types;
