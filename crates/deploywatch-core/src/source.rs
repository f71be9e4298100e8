use async_trait::async_trait;
use thiserror::Error;

use crate::aggregate::aggregate;
use crate::run::WorkflowRunsPage;
use crate::status::DeploymentStatus;
use crate::target::RepositoryTarget;

/// Failure while talking to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("authentication failed (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("rate limited (HTTP {status}), resets at {reset:?}")]
    RateLimited { status: u16, reset: Option<u64> },
    #[error("provider returned HTTP {status}")]
    Status { status: u16 },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Result of a fetch the source managed to recover from locally.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(WorkflowRunsPage),
    /// Transport or auth failure; downstream treats it as an empty page.
    Unavailable(FetchError),
}

impl FetchOutcome {
    /// The fetched page, or the empty fallback page.
    pub fn into_page(self) -> WorkflowRunsPage {
        match self {
            Self::Fetched(page) => page,
            Self::Unavailable(_) => WorkflowRunsPage::empty(),
        }
    }
}

/// Parameters for one runs request.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    /// Restrict to one workflow by id or file name. The dashboard never sets
    /// this; it matches by name over the unfiltered list instead.
    pub workflow_id: Option<&'a str>,
    /// Per-call credential override.
    pub token: Option<&'a str>,
}

impl<'a> RunRequest<'a> {
    pub fn for_target(target: &'a RepositoryTarget) -> Self {
        Self {
            owner: &target.owner,
            repo: &target.repo,
            workflow_id: None,
            token: target.token_override(),
        }
    }
}

/// Something that can produce the most recent runs of a repository.
///
/// Implementations recover transport and auth failures themselves and
/// report them as [`FetchOutcome::Unavailable`]. An `Err` means the
/// provider answered with something that could not be understood.
#[async_trait]
pub trait RunSource: Send + Sync {
    async fn fetch_runs(&self, request: RunRequest<'_>) -> Result<FetchOutcome, FetchError>;
}

/// Fetch and aggregate a single target. Always yields a status.
pub async fn evaluate<S: RunSource + ?Sized>(
    source: &S,
    target: &RepositoryTarget,
) -> DeploymentStatus {
    let repo = target.full_name();
    match source.fetch_runs(RunRequest::for_target(target)).await {
        Ok(FetchOutcome::Fetched(page)) => {
            tracing::debug!(
                repo = %repo,
                workflow = %target.workflow,
                total_count = page.total_count,
                returned = page.workflow_runs.len(),
                "Fetched workflow runs"
            );
            aggregate(target, &page.workflow_runs)
        },
        Ok(FetchOutcome::Unavailable(reason)) => {
            let mut status = aggregate(target, &[]);
            status.fetch_error = Some(reason.to_string());
            status
        },
        Err(e) => {
            tracing::error!(
                repo = %repo,
                workflow = %target.workflow,
                error = %e,
                "Failed to get deployment status"
            );
            DeploymentStatus::errored(target)
        },
    }
}
