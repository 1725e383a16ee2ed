//! Check command - evaluate one pull request and report the verdict

use crate::cli::context::CheckContext;
use crate::cli::style::{CHECK, CROSS, Stylize};
use anyhow::Context as _;
use clap::{Args, ValueEnum};
use merge_gate::config::DEFAULT_CONFIG_PATH;
use merge_gate::error::{Error, Result};
use merge_gate::policy::evaluate;
use merge_gate::report::{Report, render, render_error};
use merge_gate::types::{Platform, Verdict};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, warn};

/// Default budget for a whole check run, in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Output format for stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown summary
    Text,
    /// Verdict as JSON
    Json,
}

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: String,

    /// Pull request number
    #[arg(long, env = "PR_NUMBER")]
    pub pr: u64,

    /// Base branch reported by the triggering event (the fetched PR is authoritative)
    #[arg(long, env = "BASE_BRANCH")]
    pub base_branch: Option<String>,

    /// Source-control platform
    #[arg(long, value_enum, default_value_t = Platform::GitHub)]
    pub platform: Platform,

    /// API base URL (GitHub Enterprise or self-hosted GitLab)
    #[arg(long, env = "MERGE_GATE_API_URL")]
    pub api_url: Option<String>,

    /// Source-control access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Issue tracker base URL
    #[arg(long, env = "JIRA_BASE_URL")]
    pub jira_url: Option<String>,

    /// Issue tracker username
    #[arg(long, env = "JIRA_USERNAME")]
    pub jira_user: Option<String>,

    /// Issue tracker API token
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub jira_token: Option<String>,

    /// Path to the rules file
    #[arg(long, env = "MERGE_GATE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Give up (and block the merge) after this many seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output format for stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Run the check command, returning the process exit status
///
/// Every library error is rendered through the reporter. Failing to write the
/// CI output files is logged and never changes the exit status; only a stdout
/// encoding failure surfaces as `Err`.
pub async fn run_check(args: CheckArgs) -> anyhow::Result<i32> {
    let limit = Duration::from_secs(args.timeout);
    let result = match tokio::time::timeout(limit, check_pr(&args)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(limit)),
    };

    let report = match result {
        Ok(ref verdict) => render(verdict),
        Err(ref e) => {
            error!(error = %e, "check could not be completed");
            render_error(e)
        }
    };

    print_report(&report, result.as_ref().ok(), result.as_ref().err(), args.format)?;
    if let Err(e) = write_ci_outputs(&report) {
        error!(error = %format!("{e:#}"), "failed to write CI output files");
    }
    print_status_line(&report, args.pr);

    Ok(report.exit_code)
}

/// Fetch the PR and evaluate it
async fn check_pr(args: &CheckArgs) -> Result<Verdict> {
    let ctx = CheckContext::new(args)?;

    let pr = ctx
        .source_control
        .fetch_pull_request(args.pr)
        .await
        .map_err(|e| Error::evaluation(format!("fetching pull request #{}", args.pr), e))?;

    if let Some(ref expected) = args.base_branch
        && *expected != pr.base_ref
    {
        warn!(
            event_base = %expected,
            fetched_base = %pr.base_ref,
            "base branch changed since the event fired, using the fetched one"
        );
    }

    evaluate(
        &pr,
        &ctx.config.rules,
        &ctx.config.ticket_keys,
        ctx.source_control.as_ref(),
        ctx.tracker.as_ref(),
    )
    .await
}

fn print_report(
    report: &Report,
    verdict: Option<&Verdict>,
    error: Option<&Error>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            anstream::print!("{}", report.summary);
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "status": report.status,
                "verdict": verdict,
                "error": error.map(ToString::to_string),
            });
            let text = serde_json::to_string_pretty(&value).context("failed to encode verdict")?;
            anstream::println!("{text}");
        }
    }
    Ok(())
}

/// Append to the GitHub Actions step summary and output files when present
fn write_ci_outputs(report: &Report) -> anyhow::Result<()> {
    if let Some(path) = std::env::var_os("GITHUB_STEP_SUMMARY") {
        append(Path::new(&path), &report.summary)?;
    }
    if let Some(path) = std::env::var_os("GITHUB_OUTPUT") {
        append(Path::new(&path), &format!("verdict={}\n", report.status))?;
    }
    Ok(())
}

fn append(path: &Path, content: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}

fn print_status_line(report: &Report, pr_number: u64) {
    match report.status {
        "pass" => anstream::eprintln!(
            "{} PR #{pr_number} may merge",
            format!("{CHECK} Merge gate passed:").success()
        ),
        "fail" => anstream::eprintln!(
            "{} PR #{pr_number} does not meet policy",
            format!("{CROSS} Merge gate failed:").failure()
        ),
        _ => anstream::eprintln!(
            "{} could not evaluate PR #{pr_number}; {}",
            format!("{CROSS} Merge gate error:").warn(),
            "this is an infrastructure failure".muted()
        ),
    }
}
