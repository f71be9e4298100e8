use serde::Deserialize;
use thiserror::Error;

use deploywatch_core::target::{RepositoryTarget, TargetError};
use deploywatch_github::GitHubFetcherConfig;

pub const DEFAULT_CONFIG_PATH: &str = "deploywatch.toml";

/// Configuration problems that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("listen_addr {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
    #[error("refresh_interval_secs must be > 0")]
    ZeroRefreshInterval,
    #[error("github.per_page must be between 1 and 100, got {0}")]
    InvalidPerPage(u8),
    #[error("github.api_url must not be empty")]
    EmptyApiUrl,
    #[error("repositories[{index}] is invalid: {source}")]
    InvalidRepository { index: usize, source: TargetError },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level server configuration, loaded from `deploywatch.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub refresh_interval_secs: u64,
    pub github: GitHubFetcherConfig,
    pub auth: AuthFileConfig,
    /// Seed targets monitored from startup.
    pub repositories: Vec<RepositoryTarget>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            refresh_interval_secs: 30,
            github: GitHubFetcherConfig::default(),
            auth: AuthFileConfig::default(),
            repositories: Vec::new(),
        }
    }
}

/// Auth section of the config file.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthFileConfig {
    /// Bearer token required on `/api/v1`. None = open API.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthFileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFileConfig")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check the configuration, logging warnings for questionable settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        if !(1..=100).contains(&self.github.per_page) {
            return Err(ConfigError::InvalidPerPage(self.github.per_page));
        }
        if self.github.api_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        for (index, target) in self.repositories.iter().enumerate() {
            target
                .validate()
                .map_err(|source| ConfigError::InvalidRepository { index, source })?;
        }

        if self.github.default_token().is_none() {
            tracing::warn!(
                "No GitHub token configured, requests are unauthenticated and heavily rate limited"
            );
        }
        Ok(())
    }

    /// Secrets present in this config, as `(setting, env var to use instead)`.
    /// Call before env overrides so only values read from the file count.
    pub fn stored_secrets(&self) -> Vec<(&'static str, &'static str)> {
        let mut found = Vec::new();
        if self.github.default_token().is_some() {
            found.push(("github.token", "DEPLOYWATCH_GITHUB_TOKEN"));
        }
        if self.repositories.iter().any(|t| t.token_override().is_some()) {
            found.push(("repositories.token", "DEPLOYWATCH_GITHUB_TOKEN"));
        }
        if self.auth.bearer_token.as_deref().is_some_and(|t| !t.is_empty()) {
            found.push(("auth.bearer_token", "DEPLOYWATCH_API_TOKEN"));
        }
        found
    }

    fn warn_stored_secrets(&self, path: &str) {
        for (setting, env) in self.stored_secrets() {
            tracing::warn!(
                path = %path,
                setting,
                "Token stored in config file, use the {env} env var in production"
            );
        }
    }

    /// Load config from `deploywatch.toml` (or `DEPLOYWATCH_CONFIG`) if it
    /// exists, then apply env var overrides.
    pub fn load() -> Self {
        let path =
            std::env::var("DEPLOYWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded configuration");
                    cfg.warn_stored_secrets(&path);
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to parse config, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path, "No config file found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from an environment-like lookup. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = get("DEPLOYWATCH_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(url) = get("DEPLOYWATCH_API_URL") {
            self.github.api_url = url;
        }
        if let Some(token) = get("DEPLOYWATCH_GITHUB_TOKEN").or_else(|| get("GITHUB_TOKEN")) {
            self.github.token = token;
        }
        if let Some(token) = get("DEPLOYWATCH_API_TOKEN") {
            self.auth.bearer_token = Some(token);
        }
        if let Some(val) = get("DEPLOYWATCH_REFRESH_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.refresh_interval_secs = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.refresh_interval_secs, 30);
        assert_eq!(cfg.github.api_url, "https://api.github.com");
        assert!(cfg.auth.bearer_token.is_none());
        assert!(cfg.repositories.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let cfg = ServerConfig::from_toml_str(
            r#"
listen_addr = "127.0.0.1:9090"
refresh_interval_secs = 60

[github]
api_url = "https://ghe.example.com/api/v3"
token = "ghp_default"
per_page = 50

[auth]
bearer_token = "secret123"

[[repositories]]
owner = "jmtrz"
repo = "n8n-deployment-demo"
workflow = "🗒️n8n terraform plan/apply"

[[repositories]]
owner = "octo"
repo = "site"
workflow = "deploy"
token = "ghp_site"
"#,
        )
        .unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9090");
        assert_eq!(cfg.refresh_interval_secs, 60);
        assert_eq!(cfg.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(cfg.github.per_page, 50);
        assert_eq!(cfg.github.user_agent, "deploywatch-monitor");
        assert_eq!(cfg.auth.bearer_token.as_deref(), Some("secret123"));
        assert_eq!(cfg.repositories.len(), 2);
        assert_eq!(cfg.repositories[0].workflow, "🗒️n8n terraform plan/apply");
        assert!(cfg.repositories[0].token.is_none());
        assert_eq!(cfg.repositories[1].token.as_deref(), Some("ghp_site"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg = ServerConfig::from_toml_str("listen_addr = \"0.0.0.0:8080\"").unwrap();
        assert_eq!(cfg.github.per_page, 20);
        assert_eq!(cfg.refresh_interval_secs, 30);
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(
            ServerConfig::from_toml_str("refresh_interval_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validate_rejects_invalid_addr() {
        let cfg = ServerConfig {
            listen_addr: "not-an-address".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidListenAddr(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let cfg = ServerConfig {
            refresh_interval_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroRefreshInterval)));
    }

    #[test]
    fn validate_rejects_page_size() {
        let mut cfg = ServerConfig::default();
        cfg.github.per_page = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPerPage(0))));
        cfg.github.per_page = 101;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPerPage(101))));
    }

    #[test]
    fn validate_rejects_blank_seed_target() {
        let cfg = ServerConfig {
            repositories: vec![
                RepositoryTarget::new("octo", "site", "deploy"),
                RepositoryTarget::new("octo", " ", "deploy"),
            ],
            ..ServerConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "repositories[1] is invalid: repository name must not be empty"
        );
    }

    #[test]
    fn stored_secrets_lists_every_token_in_the_file() {
        let cfg = ServerConfig::from_toml_str(
            r#"
[github]
token = "ghp_default"

[auth]
bearer_token = "secret123"

[[repositories]]
owner = "octo"
repo = "site"
workflow = "deploy"
token = "ghp_site"
"#,
        )
        .unwrap();
        let settings: Vec<&str> = cfg.stored_secrets().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            settings,
            vec!["github.token", "repositories.token", "auth.bearer_token"]
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut cfg = ServerConfig::default();
        cfg.github.token = "ghp_default".to_string();
        cfg.auth.bearer_token = Some("api-secret".to_string());
        cfg.repositories
            .push(RepositoryTarget::new("octo", "site", "deploy").with_token("ghp_site"));
        let out = format!("{cfg:?}");
        for secret in ["ghp_default", "api-secret", "ghp_site"] {
            assert!(!out.contains(secret), "{secret} leaked in {out}");
        }
        assert!(out.contains("octo"));
    }

    #[test]
    fn no_stored_secrets_without_tokens() {
        let cfg = ServerConfig::from_toml_str("listen_addr = \"0.0.0.0:8080\"").unwrap();
        assert!(cfg.stored_secrets().is_empty());

        let mut cfg = ServerConfig::default();
        cfg.repositories
            .push(RepositoryTarget::new("octo", "site", "deploy").with_token(""));
        cfg.auth.bearer_token = Some(String::new());
        assert!(cfg.stored_secrets().is_empty());
    }

    #[test]
    fn env_overrides() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env_overrides(env(&[
            ("DEPLOYWATCH_LISTEN_ADDR", "127.0.0.1:3000"),
            ("DEPLOYWATCH_API_URL", "http://localhost:9999"),
            ("GITHUB_TOKEN", "ghp_env"),
            ("DEPLOYWATCH_API_TOKEN", "api-secret"),
            ("DEPLOYWATCH_REFRESH_SECS", "15"),
        ]));
        assert_eq!(cfg.listen_addr, "127.0.0.1:3000");
        assert_eq!(cfg.github.api_url, "http://localhost:9999");
        assert_eq!(cfg.github.token, "ghp_env");
        assert_eq!(cfg.auth.bearer_token.as_deref(), Some("api-secret"));
        assert_eq!(cfg.refresh_interval_secs, 15);
    }

    #[test]
    fn deploywatch_token_wins_over_github_token() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env_overrides(env(&[
            ("DEPLOYWATCH_GITHUB_TOKEN", "ghp_specific"),
            ("GITHUB_TOKEN", "ghp_generic"),
        ]));
        assert_eq!(cfg.github.token, "ghp_specific");
    }

    #[test]
    fn empty_and_unparsable_env_values_are_ignored() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env_overrides(env(&[
            ("DEPLOYWATCH_LISTEN_ADDR", ""),
            ("DEPLOYWATCH_REFRESH_SECS", "often"),
        ]));
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.refresh_interval_secs, 30);
    }
}
