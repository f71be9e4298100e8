use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::run::{RunConclusion, RunStatus};
use crate::status::{CompositeStatus, DeploymentStatus, LastDeployment};
use crate::time::relative_time;

/// Runs shown on a card.
pub const CARD_RUNS: usize = 3;

/// Header counters across every monitored deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub in_progress: usize,
    /// Mean of per-deployment uptime, rounded to the nearest integer.
    pub average_uptime: u8,
}

impl DashboardSummary {
    pub fn from_deployments(deployments: &[DeploymentStatus]) -> Self {
        let count = |s: CompositeStatus| deployments.iter().filter(|d| d.status == s).count();
        let total = deployments.len();
        let average_uptime = if total == 0 {
            0
        } else {
            let sum: u64 = deployments.iter().map(|d| u64::from(d.uptime)).sum();
            let n = total as u64;
            ((2 * sum + n) / (2 * n)) as u8
        };
        Self {
            total,
            successful: count(CompositeStatus::Success),
            failed: count(CompositeStatus::Failure),
            in_progress: count(CompositeStatus::InProgress),
            average_uptime,
        }
    }
}

/// Condensed run line on a deployment card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunChip {
    pub run_number: u64,
    pub status: RunStatus,
    pub conclusion: Option<RunConclusion>,
    pub updated_ago: String,
    pub url: String,
}

/// Display-ready view of one [`DeploymentStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentCard {
    pub repository: String,
    pub workflow: String,
    pub status: CompositeStatus,
    pub label: String,
    pub last_deployment: LastDeployment,
    pub last_deployment_ago: Option<String>,
    pub uptime: u8,
    pub details_url: Option<String>,
    pub runs: Vec<RunChip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl DeploymentCard {
    pub fn new(deployment: &DeploymentStatus, now: DateTime<Utc>) -> Self {
        Self {
            repository: deployment.repository.clone(),
            workflow: deployment.workflow.clone(),
            status: deployment.status,
            label: deployment.status.label().to_string(),
            last_deployment: deployment.last_deployment,
            last_deployment_ago: deployment
                .last_deployment
                .timestamp()
                .map(|ts| relative_time(ts, now)),
            uptime: deployment.uptime,
            details_url: deployment.last_run.as_ref().map(|r| r.html_url.clone()),
            runs: deployment
                .recent_runs
                .iter()
                .take(CARD_RUNS)
                .map(|run| RunChip {
                    run_number: run.run_number,
                    status: run.status,
                    conclusion: run.conclusion,
                    updated_ago: relative_time(run.updated_at, now),
                    url: run.html_url.clone(),
                })
                .collect(),
            fetch_error: deployment.fetch_error.clone(),
        }
    }
}
