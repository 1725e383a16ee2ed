//! Shared setup for the check command
//!
//! Credentials are threaded explicitly from parsed arguments into the
//! services here; nothing below the CLI reads the environment.

use crate::cli::check::CheckArgs;
use merge_gate::config::{GateConfig, load_config};
use merge_gate::error::{Error, Result};
use merge_gate::platform::{SourceControl, create_source_control, default_api_url, parse_repo_slug};
use merge_gate::retry::Retry;
use merge_gate::tracker::{IssueTracker, JiraCredentials, JiraService, UnconfiguredTracker};
use merge_gate::types::PlatformConfig;
use tracing::debug;

/// Everything a check run needs, wired from the command line
pub struct CheckContext {
    /// Validated rules and settings
    pub config: GateConfig,
    /// Source-control service (GitHub/GitLab)
    pub source_control: Box<dyn SourceControl>,
    /// Issue-tracker service
    pub tracker: Box<dyn IssueTracker>,
}

impl CheckContext {
    /// Create a new check context
    ///
    /// - Load and validate the rules file
    /// - Parse the repository slug
    /// - Create the source-control service
    /// - Create the tracker service, or a placeholder when no credentials were given
    pub fn new(args: &CheckArgs) -> Result<Self> {
        let config = load_config(&args.config)?;
        debug!(path = %args.config.display(), rules = config.rules.len(), "loaded rules");

        let retry = Retry::new(config.retry);

        let (owner, repo) = parse_repo_slug(&args.repo)?;
        let platform_config = PlatformConfig {
            platform: args.platform,
            owner,
            repo,
            api_url: args
                .api_url
                .clone()
                .unwrap_or_else(|| default_api_url(args.platform).to_string()),
        };
        debug!(platform = %platform_config.platform, repo = %platform_config.slug(), "using source control");
        let source_control = create_source_control(platform_config, &args.token, retry.clone())?;

        let tracker = create_tracker(args, retry)?;

        Ok(Self {
            config,
            source_control,
            tracker,
        })
    }
}

fn create_tracker(args: &CheckArgs, retry: Retry) -> Result<Box<dyn IssueTracker>> {
    match (&args.jira_url, &args.jira_user, &args.jira_token) {
        (Some(base_url), Some(username), Some(api_token)) => {
            let credentials = JiraCredentials {
                base_url: base_url.clone(),
                username: username.clone(),
                api_token: api_token.clone(),
            };
            debug!(base_url = %credentials.base_url, "using Jira");
            Ok(Box::new(JiraService::new(credentials, retry)?))
        }
        (None, None, None) => {
            debug!("no issue tracker configured");
            Ok(Box::new(UnconfiguredTracker))
        }
        _ => Err(Error::Config(
            "--jira-url, --jira-user and --jira-token must be given together".to_string(),
        )),
    }
}
