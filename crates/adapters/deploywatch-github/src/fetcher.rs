use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, USER_AGENT};

use deploywatch_core::run::WorkflowRunsPage;
use deploywatch_core::source::{FetchError, FetchOutcome, RunRequest, RunSource};

use crate::config::GitHubFetcherConfig;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// Pick the credential for a call: per-call override, then the configured
/// default, then none. Empty strings count as absent.
pub fn resolve_token<'a>(per_call: Option<&'a str>, default: Option<&'a str>) -> Option<&'a str> {
    per_call
        .filter(|t| !t.is_empty())
        .or_else(|| default.filter(|t| !t.is_empty()))
}

/// Fetches the most recent workflow runs of a repository from the GitHub
/// REST API.
pub struct GitHubFetcher {
    config: GitHubFetcherConfig,
    client: reqwest::Client,
}

impl GitHubFetcher {
    pub fn new(config: GitHubFetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GitHubFetcherConfig {
        &self.config
    }

    /// Runs endpoint for a request, optionally scoped to one workflow.
    pub fn runs_url(&self, request: &RunRequest<'_>) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        let RunRequest { owner, repo, .. } = request;
        match request.workflow_id {
            Some(id) => format!("{base}/repos/{owner}/{repo}/actions/workflows/{id}/runs"),
            None => format!("{base}/repos/{owner}/{repo}/actions/runs"),
        }
    }

    /// Fetch one page of runs, reporting every failure to the caller.
    pub async fn try_fetch(&self, request: &RunRequest<'_>) -> Result<WorkflowRunsPage, FetchError> {
        let url = self.runs_url(request);
        let token = resolve_token(request.token, self.config.default_token());
        tracing::debug!(url = %url, authenticated = token.is_some(), "Requesting workflow runs");

        let mut req = self
            .client
            .get(&url)
            .query(&[("per_page", self.config.per_page)])
            .header(ACCEPT, ACCEPT_V3)
            .header(USER_AGENT, &self.config.user_agent);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, resp.headers()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Map a non-success response to a [`FetchError`].
fn classify_status(status: StatusCode, headers: &HeaderMap) -> FetchError {
    let code = status.as_u16();
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let exhausted = header_str("x-ratelimit-remaining") == Some("0");

    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && exhausted) {
        return FetchError::RateLimited {
            status: code,
            reset: header_str("x-ratelimit-reset").and_then(|v| v.parse().ok()),
        };
    }
    if status == StatusCode::UNAUTHORIZED {
        return FetchError::Unauthorized { status: code };
    }
    FetchError::Status { status: code }
}

#[async_trait]
impl RunSource for GitHubFetcher {
    /// Transport and HTTP status failures are logged and reported as
    /// [`FetchOutcome::Unavailable`]; only an undecodable body is an error.
    async fn fetch_runs(&self, request: RunRequest<'_>) -> Result<FetchOutcome, FetchError> {
        let repo = format!("{}/{}", request.owner, request.repo);
        match self.try_fetch(&request).await {
            Ok(page) => Ok(FetchOutcome::Fetched(page)),
            Err(e @ FetchError::Decode(_)) => Err(e),
            Err(e) => {
                match &e {
                    FetchError::Unauthorized { .. } => {
                        let token = resolve_token(request.token, self.config.default_token());
                        tracing::warn!(
                            repo = %repo,
                            token_provided = token.is_some(),
                            token_len = token.map_or(0, str::len),
                            "GitHub API authentication failed, check the configured token"
                        );
                    },
                    FetchError::RateLimited { reset, .. } => {
                        tracing::warn!(repo = %repo, reset = ?reset, "GitHub API rate limit exhausted");
                    },
                    _ => {
                        tracing::warn!(repo = %repo, error = %e, "Failed to fetch workflow runs");
                    },
                }
                Ok(FetchOutcome::Unavailable(e))
            },
        }
    }
}
