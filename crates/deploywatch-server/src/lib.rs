pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
pub mod error;
pub mod health;
pub mod refresh;
pub mod state;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::cors::CorsLayer;

use state::AppState;

/// Build the Axum router over an existing state.
pub fn build_app(state: AppState) -> Router<()> {
    // API routes (behind bearer auth middleware)
    let api_routes = Router::new()
        .route("/deployments", get(api::get_deployments))
        .route("/dashboard", get(api::get_dashboard))
        .route("/refresh", axum::routing::post(api::post_refresh))
        .route(
            "/repositories",
            get(api::list_repositories).post(api::add_repository),
        )
        .fallback(api::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Middleware wrapper that injects AuthConfig into request extensions for the
/// bearer auth middleware.
async fn bearer_auth_layer(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut request: axum::extract::Request,
    next: middleware::Next,
) -> Result<axum::response::Response, axum::http::StatusCode> {
    request.extensions_mut().insert(state.auth.clone());
    auth::bearer_auth_middleware(request.headers().clone(), request, next).await
}
