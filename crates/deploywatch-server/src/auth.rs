use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

/// API authentication settings.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Bearer token for REST API access. None = auth disabled.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuthConfig {
    /// Whether the `Authorization` header satisfies this config.
    pub fn allows(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.bearer_token.as_deref() else {
            return true;
        };
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

/// Axum middleware that validates Bearer token authentication.
/// Requests without an `AuthConfig` extension are allowed through.
pub async fn bearer_auth_middleware(
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    if !auth_config.allows(&headers) {
        tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated API request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
