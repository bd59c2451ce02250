use std::sync::Arc;

use axum::{Router, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;

pub mod routes;
use routes::{posts, public};

// --- Public Re-exports ---

pub use auth::{JwtSessionResolver, SessionState};
pub use config::{AppConfig, AuthConfig};
pub use handlers::CreatePostHandler;
pub use store::{MemoryDocumentStore, PostgresDocumentStore, StoreState};

/// ApiDoc
///
/// Auto-generated OpenAPI document, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::create_post),
    components(schemas(models::NewPost)),
    tags(
        (name = "forum-post", description = "Forum post submission API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single shared container for the session resolver, the document store and the
/// loaded configuration, plus the post handler built once from them.
#[derive(Clone)]
pub struct AppState {
    /// Resolves the caller's session from request headers.
    pub sessions: SessionState,
    /// Pre-established document store (Postgres or in-memory).
    pub store: StoreState,
    pub config: AppConfig,
    /// Shared by every request through `FromRef`.
    pub posts: Arc<CreatePostHandler>,
}

impl AppState {
    pub fn new(sessions: SessionState, store: StoreState, config: AppConfig) -> Self {
        let posts = Arc::new(CreatePostHandler::new(
            sessions.clone(),
            store.clone(),
            &config,
        ));
        Self {
            sessions,
            store,
            config,
            posts,
        }
    }
}

/// create_router
///
/// Assembles the routes, the observability layers and the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(posts::post_routes())
        .with_state(state);

    // Request ID generation, tracing, then propagation back to the client.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span. Carries the `x-request-id` for correlation and an
/// `outcome` slot that `CreatePostHandler::handle` fills with the terminal state.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
        outcome = tracing::field::Empty,
    )
}
