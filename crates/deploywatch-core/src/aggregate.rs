use crate::matching::select_runs;
use crate::run::{RunConclusion, RunStatus, WorkflowRun};
use crate::status::{CompositeStatus, DeploymentStatus, LastDeployment};
use crate::target::RepositoryTarget;

/// Number of matched runs kept in `recent_runs`.
pub const RECENT_RUNS: usize = 5;

/// Composite status, decided from the most recent matched run only.
pub fn composite_status(last_run: Option<&WorkflowRun>) -> CompositeStatus {
    let Some(run) = last_run else {
        return CompositeStatus::Pending;
    };
    if run.status == RunStatus::InProgress {
        return CompositeStatus::InProgress;
    }
    match run.conclusion {
        Some(RunConclusion::Success) => CompositeStatus::Success,
        Some(RunConclusion::Failure) => CompositeStatus::Failure,
        Some(RunConclusion::Cancelled) => CompositeStatus::Cancelled,
        _ => CompositeStatus::Pending,
    }
}

/// Percentage of successful runs, rounded half-up. Zero for no runs.
pub fn uptime<'a>(runs: impl IntoIterator<Item = &'a WorkflowRun>) -> u8 {
    let (total, ok) = runs.into_iter().fold((0u64, 0u64), |(total, ok), run| {
        (total + 1, ok + u64::from(run.is_success()))
    });
    if total == 0 {
        return 0;
    }
    // round(100 * ok / total) == floor((200 * ok + total) / (2 * total))
    ((200 * ok + total) / (2 * total)) as u8
}

/// Reduce one fetched page into the deployment status of `target`.
pub fn aggregate(target: &RepositoryTarget, runs: &[WorkflowRun]) -> DeploymentStatus {
    let matched = select_runs(runs, &target.workflow);
    let last_run = matched.first().copied();

    DeploymentStatus {
        repository: target.full_name(),
        workflow: target.workflow.clone(),
        status: composite_status(last_run),
        last_run: last_run.cloned(),
        recent_runs: matched.iter().take(RECENT_RUNS).map(|r| (*r).clone()).collect(),
        uptime: uptime(matched.iter().copied()),
        last_deployment: last_run
            .map(|r| LastDeployment::At(r.updated_at))
            .unwrap_or(LastDeployment::Never),
        fetch_error: None,
    }
}
