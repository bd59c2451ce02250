use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that need neither a session nor the document store.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Used by load balancers and monitoring. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
}
