use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Session ---

/// Session
///
/// The resolved identity of the caller, valid for one request only.
/// Produced by a `SessionResolver`; the handler reads it and never stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    // Token expiry, when the session came from a signed token.
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    // Used as the authorship attribute of new posts.
    pub email: String,
    pub name: Option<String>,
}

impl Session {
    /// A session carrying only an email, with no expiry.
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            user: SessionUser {
                email: email.into(),
                name: None,
            },
            expires: None,
        }
    }
}

// --- Post Documents ---

/// PostDocument
///
/// A submitted post body, kept schema-less. Every field the client sent is carried
/// through to storage untouched; only `author` is ever written by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDocument(Map<String, Value>);

/// Title
///
/// How the `title` field of a submission looks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Title<'a> {
    Present(&'a str),
    Empty,
    Missing,
    // Present, but not a JSON string.
    NotText,
}

impl PostDocument {
    pub const TITLE: &'static str = "title";
    pub const AUTHOR: &'static str = "author";

    pub fn title(&self) -> Title<'_> {
        match self.0.get(Self::TITLE) {
            None => Title::Missing,
            Some(Value::String(title)) if title.is_empty() => Title::Empty,
            Some(Value::String(title)) => Title::Present(title),
            Some(_) => Title::NotText,
        }
    }

    /// Stamps the session identity as author, replacing whatever the client supplied.
    pub fn with_author(mut self, session: &Session) -> Self {
        self.0.insert(
            Self::AUTHOR.to_string(),
            Value::String(session.user.email.clone()),
        );
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for PostDocument {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// NewPost
///
/// Documented shape of a typical submission. The handler accepts any extra fields
/// and forwards them as-is; only `title` is inspected.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
}

/// InsertResult
///
/// Outcome of a successful insert. The id is store-assigned and only logged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsertResult {
    pub inserted_id: Uuid,
}
