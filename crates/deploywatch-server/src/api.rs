use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deploywatch_core::summary::{DashboardSummary, DeploymentCard};
use deploywatch_core::target::RepositoryTarget;

use crate::error::AppError;
use crate::refresh::spawn_refresh;
use crate::state::{AppState, DashboardSnapshot};

/// GET /api/v1/deployments: the latest snapshot as-is.
pub async fn get_deployments(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard_snapshot().await)
}

/// Display-ready dashboard: header counters plus one card per deployment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
    pub cards: Vec<DeploymentCard>,
    pub loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardResponse {
    pub fn from_snapshot(snapshot: DashboardSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            summary: DashboardSummary::from_deployments(&snapshot.deployments),
            cards: snapshot
                .deployments
                .iter()
                .map(|d| DeploymentCard::new(d, now))
                .collect(),
            loading: snapshot.loading,
            error: snapshot.error,
            refreshed_at: snapshot.refreshed_at,
        }
    }
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let snapshot = state.dashboard_snapshot().await;
    Json(DashboardResponse::from_snapshot(snapshot, Utc::now()))
}

/// POST /api/v1/refresh: start a batch without waiting for it.
pub async fn post_refresh(State(state): State<AppState>) -> StatusCode {
    tracing::info!("Manual refresh requested");
    spawn_refresh(state);
    StatusCode::ACCEPTED
}

/// A monitored target as reported back to clients. The token never leaves
/// the server; only its presence does.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetView {
    pub owner: String,
    pub repo: String,
    pub workflow: String,
    pub repository: String,
    pub has_token: bool,
}

impl From<&RepositoryTarget> for TargetView {
    fn from(target: &RepositoryTarget) -> Self {
        Self {
            owner: target.owner.clone(),
            repo: target.repo.clone(),
            workflow: target.workflow.clone(),
            repository: target.full_name(),
            has_token: target.token_override().is_some(),
        }
    }
}

/// GET /api/v1/repositories
pub async fn list_repositories(State(state): State<AppState>) -> Json<Vec<TargetView>> {
    let targets = state.targets.read().await;
    Json(targets.iter().map(TargetView::from).collect())
}

/// Request body for adding a repository. Missing fields are treated as
/// empty so they fail validation with a 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddRepositoryBody {
    pub owner: String,
    pub repo: String,
    pub workflow: String,
    pub token: Option<String>,
}

impl AddRepositoryBody {
    fn into_target(self) -> RepositoryTarget {
        let target = RepositoryTarget::new(
            self.owner.trim(),
            self.repo.trim(),
            self.workflow.trim(),
        );
        match self.token.filter(|t| !t.trim().is_empty()) {
            Some(token) => target.with_token(token.trim()),
            None => target,
        }
    }
}

/// POST /api/v1/repositories: append a target and start a batch.
pub async fn add_repository(
    State(state): State<AppState>,
    Json(body): Json<AddRepositoryBody>,
) -> Result<(StatusCode, Json<TargetView>), AppError> {
    let target = body.into_target();
    target.validate()?;

    let view = TargetView::from(&target);
    state.targets.write().await.push(target)?;
    tracing::info!(
        repo = %view.repository,
        workflow = %view.workflow,
        "Repository added"
    );

    spawn_refresh(state);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Fallback for unknown `/api/v1` paths. Reports the full request path,
/// not the one seen inside the nested router.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("No endpoint at {}", uri.path()))
}
