use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use deploywatch_github::GitHubFetcher;
use deploywatch_server::build_app;
use deploywatch_server::config::ServerConfig;
use deploywatch_server::refresh::spawn_refresh_loop;
use deploywatch_server::state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("DEPLOYWATCH_LOG_FORMAT").is_ok_and(|v| v == "json");
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ServerConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }

    let fetcher = match GitHubFetcher::new(config.github.clone()) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build GitHub client");
            std::process::exit(1);
        },
    };

    let listen_addr = config.listen_addr.clone();
    let state = match AppState::new(config, Arc::new(fetcher)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Invalid repository target");
            std::process::exit(1);
        },
    };

    let app = build_app(state.clone());
    let refresher = spawn_refresh_loop(state.clone());

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %listen_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        },
    };

    tracing::info!(
        addr = %listen_addr,
        targets = state.targets.read().await.len(),
        refresh_secs = state.config.refresh_interval_secs,
        "deploywatch server starting"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutting down");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "Server error");
    }
    refresher.abort();
}
