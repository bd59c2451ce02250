use thiserror::Error;

use crate::{auth::AuthError, store::StoreError};

/// PostError
///
/// Infrastructure failure while creating a post, tagged by origin. Callers only ever
/// see the generic 500 body; the origin is for logs.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("session resolution failed: {0}")]
    Auth(#[from] AuthError),

    #[error("document insert failed: {0}")]
    Storage(#[from] StoreError),
}

impl PostError {
    /// Short discriminant recorded in the `origin` log field.
    pub fn origin(&self) -> &'static str {
        match self {
            PostError::Auth(_) => "auth",
            PostError::Storage(_) => "storage",
        }
    }
}
