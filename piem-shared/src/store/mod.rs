/// Document store gateway
///
/// This module defines the contract between the resource layer and the
/// external document store. A store holds one collection per resource kind;
/// every document is a JSON object body plus the store-managed identity and
/// timestamps.
///
/// # Backends
///
/// - [`postgres::PgDocumentStore`]: one JSONB table per collection (production)
/// - [`memory::MemoryDocumentStore`]: `HashMap` behind a `RwLock` (tests, local dev)
///
/// The store handle is process-scoped: create it once at startup, share it as
/// [`SharedStore`], and call [`DocumentStore::close`] on shutdown.
///
/// # Example
///
/// ```no_run
/// use piem_shared::store::{memory::MemoryDocumentStore, Collection, DocumentStore, Query};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryDocumentStore::new();
///
/// let body = json!({ "name": "Electronics" }).as_object().cloned().unwrap();
/// let created = store.insert(Collection::Categories, body).await?;
///
/// let all = store.find(Collection::Categories, &Query::default()).await?;
/// assert_eq!(all[0].id, created.id);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A document body: a JSON object without the store-managed fields
pub type Document = Map<String, Value>;

/// Shared, process-wide store handle
pub type SharedStore = Arc<dyn DocumentStore>;

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Field name under which the identifier is exposed in decoded records
pub const ID_FIELD: &str = "_id";

/// Field name of the creation timestamp in decoded records
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Field name of the last-modification timestamp in decoded records
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored document does not match the expected record shape
    #[error("Failed to decode document: {0}")]
    Decode(String),

    /// The store has been closed
    #[error("Document store is closed")]
    Closed,
}

/// The collections held by the store, one per resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Categories,
    Inventory,
    Suppliers,
}

impl Collection {
    /// Every collection, in schema order
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Categories,
        Collection::Inventory,
        Collection::Suppliers,
    ];

    /// Collection (and backing table) name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Categories => "categories",
            Collection::Inventory => "inventory",
            Collection::Suppliers => "suppliers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordering applied to `find` results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    #[default]
    CreatedAt,

    /// Ascending, case-insensitive, by a top-level string field
    Field(&'static str),
}

/// Equality filter + ordering for `find`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional `field == value` filter on a top-level body field
    pub filter: Option<(String, Value)>,

    /// Result ordering
    pub sort: SortOrder,
}

impl Query {
    /// Matches every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches documents whose `field` equals `value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some((field.into(), value.into())),
            sort: SortOrder::default(),
        }
    }

    /// Sets the ordering
    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Whether `body` satisfies the filter
    pub fn matches(&self, body: &Document) -> bool {
        match &self.filter {
            Some((field, value)) => body.get(field) == Some(value),
            None => true,
        }
    }
}

/// A document as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Store-assigned identifier, immutable
    pub id: Uuid,

    /// Client-visible fields
    pub body: Document,

    /// Set once at insert
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful mutation
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Reads a top-level string field of the body
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }

    /// Flattens identity, timestamps and body into one JSON object
    pub fn to_json(&self) -> Value {
        let mut object = self.body.clone();
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        object.insert(
            CREATED_AT_FIELD.to_string(),
            serde_json::to_value(self.created_at).unwrap_or(Value::Null),
        );
        object.insert(
            UPDATED_AT_FIELD.to_string(),
            serde_json::to_value(self.updated_at).unwrap_or(Value::Null),
        );
        Value::Object(object)
    }

    /// Decodes the flattened document into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| StoreError::Decode(format!("document {}: {}", self.id, e)))
    }
}

/// Contract of the external document store
///
/// All operations are keyed by collection. Implementations never interpret
/// body fields beyond equality filters, case-insensitive string probes and
/// ordering.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for health reporting ("postgres", "memory")
    fn backend(&self) -> &'static str;

    /// Verifies the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Lists documents matching `query`
    async fn find(&self, collection: Collection, query: &Query) -> StoreResult<Vec<StoredDocument>>;

    /// Looks up one document by identifier
    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<StoredDocument>>;

    /// Finds a document whose string `field` equals `value` ignoring case,
    /// optionally excluding one identifier
    async fn find_one_ci(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<StoredDocument>>;

    /// Inserts a new document; `created_at == updated_at` on the result
    async fn insert(&self, collection: Collection, body: Document) -> StoreResult<StoredDocument>;

    /// Merges `changes` into the top level of an existing body and refreshes
    /// `updated_at` to a strictly later instant. Returns `None` if absent.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        changes: Document,
    ) -> StoreResult<Option<StoredDocument>>;

    /// Deletes by identifier; `false` if nothing was deleted
    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<bool>;

    /// Releases backend resources
    async fn close(&self);
}
