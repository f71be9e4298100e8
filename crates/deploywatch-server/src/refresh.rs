use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use deploywatch_core::status::{CompositeStatus, DeploymentStatus};

use crate::batch::{BATCH_ERROR_MESSAGE, BatchError, run_batch};
use crate::state::{AppState, InFlightGuard, Snapshot};

fn batch_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Fold a finished batch into the snapshot.
///
/// A completed batch replaces the deployments wholesale and clears the error.
/// A batch that could not start keeps the previous deployments and sets the
/// user-facing error message.
pub fn publish(
    snapshot: &mut Snapshot,
    outcome: Result<Vec<DeploymentStatus>, BatchError>,
    now: DateTime<Utc>,
) {
    match outcome {
        Ok(deployments) => {
            snapshot.deployments = deployments;
            snapshot.error = None;
            snapshot.refreshed_at = Some(now);
        },
        Err(_) => {
            snapshot.error = Some(BATCH_ERROR_MESSAGE.to_string());
        },
    }
}

/// Run one batch over the current targets and publish the result.
pub async fn refresh_now(state: &AppState) {
    let _guard = InFlightGuard::new(Arc::clone(&state.in_flight));
    let batch = batch_id();
    let targets = state.targets.read().await.snapshot();
    tracing::debug!(batch = %batch, targets = targets.len(), "Starting refresh batch");

    let outcome = run_batch(Arc::clone(&state.source), targets).await;
    match &outcome {
        Ok(deployments) => {
            let failed = deployments
                .iter()
                .filter(|d| d.status == CompositeStatus::Failure)
                .count();
            tracing::info!(
                batch = %batch,
                deployments = deployments.len(),
                failed,
                "Refresh batch complete"
            );
        },
        Err(e) => {
            tracing::error!(batch = %batch, error = %e, "Refresh batch could not start");
        },
    }
    publish(&mut *state.snapshot.write().await, outcome, Utc::now());
}

/// Start a batch in the background without waiting for it.
pub fn spawn_refresh(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move { refresh_now(&state).await })
}

/// Timer that starts a batch every `refresh_interval_secs`, beginning now.
/// A tick never waits for the previous batch, so slow batches may overlap.
pub fn spawn_refresh_loop(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.refresh_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            spawn_refresh(state.clone());
        }
    })
}
