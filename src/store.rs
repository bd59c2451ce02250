use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder, types::Json};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::InsertResult;

/// StoreError
///
/// Failure reported by a `DocumentStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid namespace or collection name: {0:?}")]
    InvalidName(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// DocumentStore Trait
///
/// A schema-less persistence service organized into namespaces (databases) and named
/// collections. Implementations assign the record id; callers never supply one.
///
/// **Send + Sync + async_trait** make `Arc<dyn DocumentStore>` shareable across
/// Axum's request tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts exactly one record. Never retried by the store.
    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<InsertResult, StoreError>;
}

/// StoreState
///
/// The concrete type used to share the document store across the application state.
pub type StoreState = Arc<dyn DocumentStore>;

/// Accepts `[a-z0-9_]+` not starting with a digit, so the name is safe to quote into SQL.
pub fn validate_name(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// PostgresDocumentStore
///
/// Document store backed by Postgres JSONB. A namespace maps to a schema and a
/// collection to a table of shape `(id uuid, document jsonb, created_at timestamptz)`.
/// The table must already exist.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new store over an already initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<InsertResult, StoreError> {
        let schema = validate_name(database)?;
        let table = validate_name(collection)?;
        let inserted_id = Uuid::new_v4();

        // Identifiers cannot be bound; they are validated above and quoted here.
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!(r#"INSERT INTO "{schema}"."{table}" (id, document) VALUES ("#));
        builder.push_bind(inserted_id);
        builder.push(", ");
        builder.push_bind(Json(document));
        builder.push(")");

        builder.build().execute(&self.pool).await.map_err(|e| {
            // The handler reports the failure with its origin; this is detail only.
            tracing::debug!("insert_one into {}.{} failed: {:?}", schema, table, e);
            StoreError::from(e)
        })?;

        Ok(InsertResult { inserted_id })
    }
}

/// StoredDocument
///
/// A record held by the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub document: Map<String, Value>,
}

/// MemoryDocumentStore
///
/// In-process implementation of `DocumentStore`, used for local runs without Postgres
/// and for tests. It can be switched into a failing mode to simulate an outage.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<(String, String), Vec<StoredDocument>>>,
    /// When true, every insert returns a simulated failure.
    pub should_fail: bool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of one collection, in insertion order.
    pub async fn documents(&self, database: &str, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .read()
            .await
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<InsertResult, StoreError> {
        if self.should_fail {
            return Err(StoreError::Unavailable(
                "Mock Store Error: Simulation requested".to_string(),
            ));
        }

        let key = (
            validate_name(database)?.to_string(),
            validate_name(collection)?.to_string(),
        );
        let inserted_id = Uuid::new_v4();

        self.collections
            .write()
            .await
            .entry(key)
            .or_default()
            .push(StoredDocument {
                id: inserted_id,
                document,
            });

        Ok(InsertResult { inserted_id })
    }
}
