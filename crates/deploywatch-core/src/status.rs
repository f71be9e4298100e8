use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::run::WorkflowRun;
use crate::target::RepositoryTarget;

/// Single derived health value for a repository/workflow pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeStatus {
    Success,
    Failure,
    InProgress,
    Pending,
    Cancelled,
}

impl CompositeStatus {
    /// Human-facing label used on deployment cards.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Deployed",
            Self::Failure => "Failed",
            Self::InProgress => "Deploying",
            Self::Cancelled => "Cancelled",
            Self::Pending => "Pending",
        }
    }
}

/// When the tracked workflow last moved, or why that is unknown.
///
/// Serialized as an RFC 3339 timestamp, or the literal `"Never"` / `"Error"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LastDeployment {
    At(DateTime<Utc>),
    Never,
    Error,
}

impl LastDeployment {
    pub fn timestamp(self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(ts) => Some(ts),
            Self::Never | Self::Error => None,
        }
    }
}

impl fmt::Display for LastDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Never => f.write_str("Never"),
            Self::Error => f.write_str("Error"),
        }
    }
}

impl FromStr for LastDeployment {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Never" => Ok(Self::Never),
            "Error" => Ok(Self::Error),
            other => {
                let ts = DateTime::parse_from_rfc3339(other)?;
                Ok(Self::At(ts.with_timezone(&Utc)))
            },
        }
    }
}

impl From<LastDeployment> for String {
    fn from(value: LastDeployment) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for LastDeployment {
    type Error = chrono::ParseError;

    fn try_from(value: String) -> Result<Self, chrono::ParseError> {
        value.parse()
    }
}

/// Aggregated deployment status for one `(owner, repo, workflow)` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub repository: String,
    pub workflow: String,
    pub status: CompositeStatus,
    pub last_run: Option<WorkflowRun>,
    pub recent_runs: Vec<WorkflowRun>,
    pub uptime: u8,
    pub last_deployment: LastDeployment,
    /// Set when the fetcher recovered from a transport or auth failure and
    /// the status was computed from an empty page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl DeploymentStatus {
    /// Terminal status for a target whose fetch-to-aggregation pipeline failed.
    pub fn errored(target: &RepositoryTarget) -> Self {
        Self {
            repository: target.full_name(),
            workflow: target.workflow.clone(),
            status: CompositeStatus::Failure,
            last_run: None,
            recent_runs: Vec::new(),
            uptime: 0,
            last_deployment: LastDeployment::Error,
            fetch_error: None,
        }
    }
}
