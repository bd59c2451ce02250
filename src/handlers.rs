use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, Json,
    extract::{FromRef, FromRequest, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::{
    AppState,
    auth::SessionState,
    config::{AppConfig, AuthConfig},
    error::PostError,
    models::{InsertResult, NewPost, PostDocument, Title},
    store::StoreState,
};

/// Namespace that holds forum data in the document store.
pub const FORUM_DATABASE: &str = "forum";
/// Collection new posts are written to.
pub const POST_COLLECTION: &str = "post";
/// Where a successful submission is redirected.
pub const LIST_PATH: &str = "/list";
/// Fixed body of every 500 response. Never carries error detail.
pub const DB_ERROR_MESSAGE: &str = "DB error";

/// PostRequest
///
/// Transport-neutral view of an inbound submission.
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Map<String, Value>,
}

/// IgnoreReason
///
/// Why the handler decided not to act on a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IgnoreReason {
    MethodNotAllowed,
    Unauthenticated,
}

/// Outcome
///
/// Terminal state of one submission. Every request ends in exactly one of these.
#[derive(Debug)]
pub enum Outcome {
    /// The handler took no action and wrote nothing.
    Ignored(IgnoreReason),
    /// Validation failed; carries the message for the caller.
    Rejected(String),
    /// The post was stored; redirect to the given path.
    Redirected(&'static str),
    /// Session resolution or storage failed.
    Failed(PostError),
}

impl Outcome {
    /// Name of the terminal state, recorded on the request span.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ignored(IgnoreReason::MethodNotAllowed) => "ignored_method",
            Outcome::Ignored(IgnoreReason::Unauthenticated) => "ignored_anonymous",
            Outcome::Rejected(_) => "rejected",
            Outcome::Redirected(_) => "redirected",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// TitleRule
///
/// Decides which titles are rejected before anything else happens.
/// By default only an explicitly empty title is rejected; `strict` also rejects a
/// missing or non-string title.
#[derive(Debug, Clone)]
pub struct TitleRule {
    pub strict: bool,
    pub message: String,
}

impl TitleRule {
    pub fn rejects(&self, document: &PostDocument) -> bool {
        match document.title() {
            Title::Present(_) => false,
            Title::Empty => true,
            Title::Missing | Title::NotText => self.strict,
        }
    }
}

/// CreatePostHandler
///
/// Validates, authorizes and persists one post submission.
///
/// The order is fixed: method check, title check, session resolution, author
/// stamping, insert. Session resolution and insert share one failure region whose
/// errors all become `Outcome::Failed`.
#[derive(Clone)]
pub struct CreatePostHandler {
    sessions: SessionState,
    store: StoreState,
    auth: AuthConfig,
    titles: TitleRule,
}

impl CreatePostHandler {
    pub fn new(sessions: SessionState, store: StoreState, config: &AppConfig) -> Self {
        Self {
            sessions,
            store,
            auth: config.auth.clone(),
            titles: TitleRule {
                strict: config.require_title,
                message: config.title_required_message.clone(),
            },
        }
    }

    pub async fn handle(&self, request: PostRequest) -> Outcome {
        let outcome = self.run(request).await;
        tracing::Span::current().record("outcome", outcome.label());
        outcome
    }

    async fn run(&self, request: PostRequest) -> Outcome {
        if request.method != Method::POST {
            tracing::info!(method = %request.method, "ignoring submission with non-POST method");
            return Outcome::Ignored(IgnoreReason::MethodNotAllowed);
        }

        let document = PostDocument::from(request.body);
        if self.titles.rejects(&document) {
            tracing::warn!("rejected post submission without a title");
            return Outcome::Rejected(self.titles.message.clone());
        }

        match self.persist(&request.headers, document).await {
            Ok(Some(result)) => {
                tracing::info!(inserted_id = %result.inserted_id, "post created");
                Outcome::Redirected(LIST_PATH)
            }
            Ok(None) => {
                tracing::info!("ignoring post submission without a session");
                Outcome::Ignored(IgnoreReason::Unauthenticated)
            }
            Err(e) => {
                tracing::error!(origin = e.origin(), error = %e, "create post failed");
                Outcome::Failed(e)
            }
        }
    }

    /// Resolves the session and, if there is one, stores the document under its author.
    async fn persist(
        &self,
        headers: &HeaderMap,
        document: PostDocument,
    ) -> Result<Option<InsertResult>, PostError> {
        let Some(session) = self.sessions.resolve(headers, &self.auth).await? else {
            return Ok(None);
        };

        let document = document.with_author(&session);
        let result = self
            .store
            .insert_one(FORUM_DATABASE, POST_COLLECTION, document.into_inner())
            .await?;

        Ok(Some(result))
    }
}

impl FromRef<AppState> for Arc<CreatePostHandler> {
    fn from_ref(state: &AppState) -> Self {
        state.posts.clone()
    }
}

/// Renders each terminal state concretely so no request is left without a response.
impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Ignored(IgnoreReason::MethodNotAllowed) => {
                (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")]).into_response()
            }
            Outcome::Ignored(IgnoreReason::Unauthenticated) => {
                StatusCode::UNAUTHORIZED.into_response()
            }
            Outcome::Rejected(message) => (StatusCode::BAD_REQUEST, Json(message)).into_response(),
            Outcome::Redirected(path) => {
                (StatusCode::FOUND, [(header::LOCATION, path)]).into_response()
            }
            Outcome::Failed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(DB_ERROR_MESSAGE)).into_response()
            }
        }
    }
}

/// Submission
///
/// Extractor for a post body sent either as JSON or as an HTML form.
/// Form values arrive as strings; JSON values keep their types.
pub struct Submission(pub Map<String, Value>);

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect(),
            ))
        } else {
            let Json(fields) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(fields))
        }
    }
}

/// create_post
///
/// [Public Route] Accepts a new forum post. Every method is routed here so the handler
/// applies its own method check; the body is only read for `POST`.
///
/// *Authorization*: resolved inside the handler, after the title check, so an anonymous
/// caller with an empty title still gets a 400.
#[utoipa::path(
    post,
    path = "/api/post/new",
    request_body(content = NewPost, content_type = "application/json"),
    responses(
        (status = 302, description = "Created, redirects to /list"),
        (status = 400, description = "Title missing", body = String),
        (status = 401, description = "No session"),
        (status = 405, description = "Method other than POST"),
        (status = 500, description = "Session or storage failure", body = String)
    )
)]
pub async fn create_post(
    State(handler): State<Arc<CreatePostHandler>>,
    request: Request,
) -> Response {
    let method = request.method().clone();
    let headers = request.headers().clone();

    let body = if method == Method::POST {
        match Submission::from_request(request, &()).await {
            Ok(Submission(fields)) => fields,
            Err(rejection) => return rejection,
        }
    } else {
        Map::new()
    };

    handler
        .handle(PostRequest {
            method,
            headers,
            body,
        })
        .await
        .into_response()
}
