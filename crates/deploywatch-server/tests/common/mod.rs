use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use deploywatch_core::run::{RunConclusion, RunStatus};
use deploywatch_core::source::{FetchError, FetchOutcome, RunRequest, RunSource};
use deploywatch_core::target::RepositoryTarget;
use deploywatch_core::test_helpers::{make_run, page, ts};
use deploywatch_server::build_app;
use deploywatch_server::config::{AuthFileConfig, ServerConfig};
use deploywatch_server::state::AppState;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a dashboard with no auth over the given targets.
    pub async fn new(repositories: Vec<RepositoryTarget>) -> Self {
        let config = ServerConfig {
            repositories,
            ..ServerConfig::default()
        };
        Self::start(config, Arc::new(OwnerSource)).await
    }

    /// Start a dashboard that requires `token` on `/api/v1`.
    pub async fn with_auth(token: &str) -> Self {
        let config = ServerConfig {
            auth: AuthFileConfig {
                bearer_token: Some(token.to_string()),
            },
            ..ServerConfig::default()
        };
        Self::start(config, Arc::new(OwnerSource)).await
    }

    pub async fn start(config: ServerConfig, source: Arc<dyn RunSource>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = AppState::new(config, source).unwrap();
        let app = build_app(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api(&self, path: &str) -> String {
        format!("http://{}/api/v1{path}", self.addr)
    }

    /// Trigger a refresh and wait until a batch has completed and none is
    /// running (5s timeout). Returns the `/deployments` body.
    pub async fn refresh_and_wait(&self) -> serde_json::Value {
        let client = reqwest::Client::new();
        let before = self.state.snapshot.read().await.refreshed_at;
        let resp = client.post(self.api("/refresh")).send().await.unwrap();
        assert_eq!(resp.status(), 202);
        self.wait_for_batch_after(before).await
    }

    /// Poll `/deployments` until `refreshedAt` moves past `before` and
    /// nothing is loading.
    pub async fn wait_for_batch_after(
        &self,
        before: Option<chrono::DateTime<chrono::Utc>>,
    ) -> serde_json::Value {
        let client = reqwest::Client::new();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let body: serde_json::Value = client
                    .get(self.api("/deployments"))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                let refreshed = self.state.snapshot.read().await.refreshed_at;
                if refreshed.is_some() && refreshed != before && body["loading"] == false {
                    return body;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timed out waiting for refresh batch")
    }
}

/// Answers per owner: `broken` returns an undecodable page, `down` is
/// unavailable, anything else gets a deploy history of two successes and
/// one failure plus an unrelated lint run.
pub struct OwnerSource;

#[async_trait]
impl RunSource for OwnerSource {
    async fn fetch_runs(&self, request: RunRequest<'_>) -> Result<FetchOutcome, FetchError> {
        match request.owner {
            "broken" => Err(FetchError::Decode("expected value at line 1".into())),
            "down" => Ok(FetchOutcome::Unavailable(FetchError::Status { status: 502 })),
            _ => Ok(FetchOutcome::Fetched(page(vec![
                make_run(4, "Lint", RunStatus::Completed, Some(RunConclusion::Failure), ts(400)),
                make_run(3, "Deploy", RunStatus::Completed, Some(RunConclusion::Success), ts(300)),
                make_run(2, "Deploy", RunStatus::Completed, Some(RunConclusion::Failure), ts(200)),
                make_run(1, "Deploy", RunStatus::Completed, Some(RunConclusion::Success), ts(100)),
            ]))),
        }
    }
}

/// Minimal GitHub API double serving one successful deploy run for every
/// repository, so the real fetcher can be wired end to end.
pub async fn spawn_fake_github() -> SocketAddr {
    async fn runs(Path((owner, repo)): Path<(String, String)>) -> Response {
        if owner == "locked" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Bad credentials" })),
            )
                .into_response();
        }
        Json(serde_json::json!({
            "total_count": 1,
            "workflow_runs": [{
                "id": 77,
                "name": "Deploy to production",
                "head_branch": "main",
                "head_sha": "abc123",
                "status": "completed",
                "conclusion": "success",
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:05:00Z",
                "html_url": format!("https://github.com/{owner}/{repo}/actions/runs/77"),
                "jobs_url": "",
                "logs_url": "",
                "run_number": 12,
                "event": "push",
                "workflow_id": 5
            }]
        }))
        .into_response()
    }

    let app = axum::Router::new().route("/repos/{owner}/{repo}/actions/runs", axum::routing::get(runs));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
