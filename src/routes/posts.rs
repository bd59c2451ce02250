use crate::{AppState, handlers};
use axum::{Router, routing::any};

/// Posts Router Module
///
/// Every method on the submission path reaches `create_post`, which answers non-POST
/// requests itself (405 with `Allow: POST`).
pub fn post_routes() -> Router<AppState> {
    Router::new()
        // ANY /api/post/new
        // Creates one post from a JSON or form body and redirects to /list.
        .route("/api/post/new", any(handlers::create_post))
}
