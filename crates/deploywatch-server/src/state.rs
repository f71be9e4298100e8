use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use deploywatch_core::source::RunSource;
use deploywatch_core::status::DeploymentStatus;
use deploywatch_core::target::{TargetError, TargetSet};

use crate::auth::AuthConfig;
use crate::config::ServerConfig;

pub type SharedTargets = Arc<RwLock<TargetSet>>;
pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

/// Result of the most recently completed batch.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub deployments: Vec<DeploymentStatus>,
    /// User-facing message when the last batch could not start.
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// What the dashboard sees: the snapshot plus the loading flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub deployments: Vec<DeploymentStatus>,
    pub loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn RunSource>,
    pub targets: SharedTargets,
    pub snapshot: SharedSnapshot,
    /// Batches currently running; overlapping refreshes are allowed.
    pub in_flight: Arc<AtomicUsize>,
    pub auth: AuthConfig,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, source: Arc<dyn RunSource>) -> Result<Self, TargetError> {
        let targets = TargetSet::from_seed(config.repositories.clone())?;
        let auth = AuthConfig {
            bearer_token: config.auth.bearer_token.clone(),
        };
        Ok(Self {
            source,
            targets: Arc::new(RwLock::new(targets)),
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            auth,
            config: Arc::new(config),
        })
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub async fn dashboard_snapshot(&self) -> DashboardSnapshot {
        let snap = self.snapshot.read().await;
        DashboardSnapshot {
            deployments: snap.deployments.clone(),
            loading: self.is_loading(),
            error: snap.error.clone(),
            refreshed_at: snap.refreshed_at,
        }
    }
}

/// RAII guard that counts a running batch.
pub struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
