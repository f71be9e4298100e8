use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution phase reported by the provider for a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
    #[serde(other)]
    Unknown,
}

/// Terminal outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    StartupFailure,
    #[serde(other)]
    Unknown,
}

/// The user (or bot) that triggered a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// One workflow run as returned by `GET /repos/{owner}/{repo}/actions/runs`.
///
/// `conclusion` is only meaningful once `status` is `completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    pub head_sha: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    #[serde(default)]
    pub jobs_url: String,
    #[serde(default)]
    pub logs_url: String,
    pub run_number: u64,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub actor: Option<Actor>,
    #[serde(default)]
    pub workflow_id: u64,
}

impl WorkflowRun {
    pub fn is_success(&self) -> bool {
        self.conclusion == Some(RunConclusion::Success)
    }

    /// Conclusion, if the run has actually finished.
    pub fn outcome(&self) -> Option<RunConclusion> {
        match self.status {
            RunStatus::Completed => self.conclusion,
            _ => None,
        }
    }
}

/// A single page of workflow runs, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunsPage {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

impl WorkflowRunsPage {
    /// The page used when nothing could be fetched.
    pub fn empty() -> Self {
        Self::default()
    }
}
