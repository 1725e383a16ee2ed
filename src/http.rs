//! Shared HTTP plumbing for the upstream clients
//!
//! Maps transport failures and HTTP statuses onto the error taxonomy so that
//! every client retries, and gives up, on the same conditions.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which upstream produced a response, for API error variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// GitHub REST API
    GitHub,
    /// GitLab REST API
    GitLab,
    /// Issue tracker REST API
    Tracker,
}

impl Upstream {
    fn api_error(self, msg: String) -> Error {
        match self {
            Self::GitHub => Error::GitHubApi(msg),
            Self::GitLab => Error::GitLabApi(msg),
            Self::Tracker => Error::TrackerApi(msg),
        }
    }
}

/// Build the HTTP client shared by all requests of one service
pub fn build_client(upstream: Upstream) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("merge-gate")
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| upstream.api_error(format!("failed to create HTTP client: {e}")))
}

/// Header GitHub and GitLab use to report the remaining request quota
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Whether a 403 is a rate limit rather than a permission problem
///
/// GitHub answers an exhausted primary quota with 403 and
/// `x-ratelimit-remaining: 0`, and secondary limits with `Retry-After`.
fn is_rate_limited(headers: &HeaderMap) -> bool {
    headers.contains_key(RETRY_AFTER)
        || headers
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0")
}

/// Classify a non-success HTTP status
pub fn classify_status(
    upstream: Upstream,
    status: StatusCode,
    headers: &HeaderMap,
    what: &str,
) -> Error {
    match status {
        StatusCode::FORBIDDEN if is_rate_limited(headers) => {
            Error::Transient(format!("{what}: {status} (rate limited)"))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("{what}: {status}"))
        }
        StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Error::Transient(format!("{what}: {status}"))
        }
        s if s.is_server_error() => Error::Transient(format!("{what}: {status}")),
        _ => upstream.api_error(format!("{what}: unexpected status {status}")),
    }
}

/// Classify a transport-level failure
pub fn classify_send_error(upstream: Upstream, err: &reqwest::Error, what: &str) -> Error {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        Error::Transient(format!("{what}: {err}"))
    } else {
        upstream.api_error(format!("{what}: {err}"))
    }
}

/// Send a request and decode a JSON body, classifying every failure
pub async fn get_json<T: DeserializeOwned>(
    upstream: Upstream,
    request: RequestBuilder,
    what: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_send_error(upstream, &e, what))?;

    let status = response.status();
    if !status.is_success() {
        debug!(%status, what, "request returned non-success");
        return Err(classify_status(upstream, status, response.headers(), what));
    }

    response
        .json()
        .await
        .map_err(|e| upstream.api_error(format!("failed to parse {what}: {e}")))
}
