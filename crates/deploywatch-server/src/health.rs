use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub targets: usize,
    pub loading: bool,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Health endpoint, served outside the auth layer.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let targets = state.targets.read().await.len();
    let last_refresh = state.snapshot.read().await.refreshed_at;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        targets,
        loading: state.is_loading(),
        last_refresh,
    })
}
