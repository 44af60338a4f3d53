use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no token. Everything here must be safe for anonymous callers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and container orchestration.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Exchanges credentials for a bearer token.
        .route("/api/auth/login", post(handlers::auth::login))
}
