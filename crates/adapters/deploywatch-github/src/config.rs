use std::fmt;

use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "deploywatch-monitor";
pub const DEFAULT_PER_PAGE: u8 = 20;

/// Configuration for the GitHub Actions run fetcher.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GitHubFetcherConfig {
    /// Base REST API URL, without a trailing slash.
    pub api_url: String,
    /// Default personal access token. Empty means unauthenticated requests.
    pub token: String,
    /// Runs requested per call.
    pub per_page: u8,
    /// Fixed client identifier sent as `User-Agent`.
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for GitHubFetcherConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            per_page: DEFAULT_PER_PAGE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for GitHubFetcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubFetcherConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.default_token().map(|_| "<redacted>"))
            .field("per_page", &self.per_page)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl GitHubFetcherConfig {
    /// The configured default token, if any.
    pub fn default_token(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|t| !t.is_empty())
    }
}
