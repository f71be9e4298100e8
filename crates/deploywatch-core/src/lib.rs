pub mod aggregate;
pub mod matching;
pub mod run;
pub mod source;
pub mod status;
pub mod summary;
pub mod target;
pub mod time;

pub use aggregate::aggregate;
pub use run::{Actor, RunConclusion, RunStatus, WorkflowRun, WorkflowRunsPage};
pub use source::{FetchError, FetchOutcome, RunRequest, RunSource, evaluate};
pub use status::{CompositeStatus, DeploymentStatus, LastDeployment};
pub use target::{RepositoryTarget, TargetError, TargetSet};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::run::{Actor, RunConclusion, RunStatus, WorkflowRun, WorkflowRunsPage};
    use crate::source::{FetchError, FetchOutcome, RunRequest, RunSource};

    /// Fixed instant `secs` seconds after 2025-01-01T00:00:00Z.
    pub fn ts(secs: i64) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        base + chrono::Duration::seconds(secs)
    }

    /// Build a run for `octo/site` with the given lifecycle fields.
    pub fn make_run(
        id: u64,
        name: &str,
        status: RunStatus,
        conclusion: Option<RunConclusion>,
        updated_at: DateTime<Utc>,
    ) -> WorkflowRun {
        WorkflowRun {
            id,
            name: Some(name.to_string()),
            head_branch: Some("main".to_string()),
            head_sha: format!("{id:040x}"),
            status,
            conclusion,
            created_at: updated_at,
            updated_at,
            html_url: format!("https://github.com/octo/site/actions/runs/{id}"),
            jobs_url: format!("https://api.github.com/repos/octo/site/actions/runs/{id}/jobs"),
            logs_url: format!("https://api.github.com/repos/octo/site/actions/runs/{id}/logs"),
            run_number: id,
            event: "push".to_string(),
            actor: Some(Actor {
                login: "octocat".to_string(),
                avatar_url: "https://avatars.githubusercontent.com/u/583231".to_string(),
            }),
            workflow_id: 1,
        }
    }

    /// A successful completed run updated `id` seconds after the base instant.
    pub fn named_run(id: u64, name: &str) -> WorkflowRun {
        make_run(
            id,
            name,
            RunStatus::Completed,
            Some(RunConclusion::Success),
            ts(id as i64),
        )
    }

    pub fn page(runs: Vec<WorkflowRun>) -> WorkflowRunsPage {
        WorkflowRunsPage {
            total_count: runs.len() as u64,
            workflow_runs: runs,
        }
    }

    /// A [`RunSource`] that returns the same answer for every repository.
    pub struct StaticSource {
        answer: Result<FetchOutcome, FetchError>,
    }

    impl StaticSource {
        pub fn ok(page: WorkflowRunsPage) -> Self {
            Self {
                answer: Ok(FetchOutcome::Fetched(page)),
            }
        }

        pub fn unavailable(reason: FetchError) -> Self {
            Self {
                answer: Ok(FetchOutcome::Unavailable(reason)),
            }
        }

        pub fn err(error: FetchError) -> Self {
            Self { answer: Err(error) }
        }
    }

    #[async_trait]
    impl RunSource for StaticSource {
        async fn fetch_runs(&self, _request: RunRequest<'_>) -> Result<FetchOutcome, FetchError> {
            self.answer.clone()
        }
    }
}
