use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use deploywatch_core::source::{RunSource, evaluate};
use deploywatch_core::status::DeploymentStatus;
use deploywatch_core::target::{RepositoryTarget, TargetError};

/// Shown to the user when a batch cannot even start.
pub const BATCH_ERROR_MESSAGE: &str =
    "Failed to load deployment data. Please check your configuration.";

/// A batch that never started. Per-repository failures are not batch errors.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("target {index} ({repository}) is invalid: {source}")]
    InvalidTarget {
        index: usize,
        repository: String,
        source: TargetError,
    },
}

/// Fetch and aggregate every target concurrently, one status per target in
/// input order. Waits for all of them before returning.
pub async fn run_batch(
    source: Arc<dyn RunSource>,
    targets: Vec<RepositoryTarget>,
) -> Result<Vec<DeploymentStatus>, BatchError> {
    for (index, target) in targets.iter().enumerate() {
        target
            .validate()
            .map_err(|source| BatchError::InvalidTarget {
                index,
                repository: target.full_name(),
                source,
            })?;
    }

    let handles: Vec<_> = targets
        .iter()
        .cloned()
        .map(|target| {
            let source = Arc::clone(&source);
            tokio::spawn(async move { evaluate(source.as_ref(), &target).await })
        })
        .collect();

    let results = join_all(handles).await;

    Ok(targets
        .iter()
        .zip(results)
        .map(|(target, result)| match result {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    repo = %target.full_name(),
                    workflow = %target.workflow,
                    error = %e,
                    "Deployment status task failed"
                );
                DeploymentStatus::errored(target)
            },
        })
        .collect())
}
