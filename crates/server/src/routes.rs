//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for probes)
        .route("/v1/health", get(handlers::health_check))
        // Direct-write control plane
        .route(
            "/v1/artifacts/{*hash}",
            post(handlers::publish_artifact).delete(handlers::invalidate_artifact),
        )
        // Substituter-compatible read path: everything else resolves by hash
        .fallback(handlers::fetch_artifact)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
