/// In-memory document store
///
/// Keeps every collection in a `Vec` behind a `tokio::sync::RwLock`, in
/// insertion order. Used by the test suites and by `STORE_BACKEND=memory`
/// for local development without PostgreSQL. Data does not survive a restart.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    Collection, Document, DocumentStore, Query, SortOrder, StoreError, StoreResult, StoredDocument,
};

/// Document store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<StoredDocument>>>,
    closed: AtomicBool,
}

impl MemoryDocumentStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

fn sort_key(doc: &StoredDocument, field: &str) -> String {
    match doc.body.get(field) {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn find(&self, collection: Collection, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        let mut found: Vec<StoredDocument> = collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.matches(&doc.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        match query.sort {
            SortOrder::CreatedAt => found.sort_by_key(|doc| doc.created_at),
            SortOrder::Field(field) => found.sort_by_cached_key(|doc| sort_key(doc, field)),
        }

        debug!(%collection, count = found.len(), "find");
        Ok(found)
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<StoredDocument>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn find_one_ci(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<StoredDocument>> {
        self.ensure_open()?;
        let needle = value.to_lowercase();
        let collections = self.collections.read().await;

        Ok(collections
            .get(&collection)
            .and_then(|docs| {
                docs.iter().find(|doc| {
                    Some(doc.id) != exclude
                        && doc
                            .str_field(field)
                            .is_some_and(|candidate| candidate.to_lowercase() == needle)
                })
            })
            .cloned())
    }

    async fn insert(&self, collection: Collection, body: Document) -> StoreResult<StoredDocument> {
        self.ensure_open()?;
        let now = Utc::now();
        let doc = StoredDocument {
            id: Uuid::new_v4(),
            body,
            created_at: now,
            updated_at: now,
        };

        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(doc.clone());

        debug!(%collection, id = %doc.id, "insert");
        Ok(doc)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        changes: Document,
    ) -> StoreResult<Option<StoredDocument>> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(None);
        };

        doc.body.extend(changes);

        // Clock reads can repeat within the timer resolution.
        let now = Utc::now();
        doc.updated_at = if now > doc.updated_at {
            now
        } else {
            doc.updated_at + Duration::microseconds(1)
        };

        debug!(%collection, %id, "update");
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };

        let before = docs.len();
        docs.retain(|doc| doc.id != id);

        debug!(%collection, %id, "delete");
        Ok(docs.len() < before)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_sets_equal_timestamps() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .insert(Collection::Categories, body(json!({ "name": "Tools" })))
            .await
            .unwrap();

        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(store.len(Collection::Categories).await, 1);
        assert_eq!(store.len(Collection::Users).await, 0);
    }

    #[tokio::test]
    async fn test_update_merges_and_advances_timestamp() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .insert(
                Collection::Suppliers,
                body(json!({ "name": "Acme", "city": "Austin" })),
            )
            .await
            .unwrap();

        let updated = store
            .update(Collection::Suppliers, doc.id, body(json!({ "city": "Boston" })))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.body["name"], "Acme");
        assert_eq!(updated.body["city"], "Boston");
        assert_eq!(updated.created_at, doc.created_at);
        assert!(updated.updated_at > doc.updated_at);

        let again = store
            .update(Collection::Suppliers, doc.id, body(json!({ "city": "Boston" })))
            .await
            .unwrap()
            .unwrap();
        assert!(again.updated_at > updated.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = MemoryDocumentStore::new();
        let result = store
            .update(Collection::Users, Uuid::new_v4(), Document::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_one_ci_ignores_case_and_exclusion() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .insert(Collection::Categories, body(json!({ "name": "Electronics" })))
            .await
            .unwrap();

        let hit = store
            .find_one_ci(Collection::Categories, "name", "eLeCtRoNiCs", None)
            .await
            .unwrap();
        assert_eq!(hit.map(|d| d.id), Some(doc.id));

        let excluded = store
            .find_one_ci(Collection::Categories, "name", "electronics", Some(doc.id))
            .await
            .unwrap();
        assert!(excluded.is_none());
    }

    #[tokio::test]
    async fn test_find_filters_and_sorts_by_field() {
        let store = MemoryDocumentStore::new();
        for (name, active) in [("zeta", true), ("Alpha", true), ("beta", false)] {
            store
                .insert(
                    Collection::Categories,
                    body(json!({ "name": name, "isActive": active })),
                )
                .await
                .unwrap();
        }

        let active = store
            .find(
                Collection::Categories,
                &Query::eq("isActive", true).sorted_by(SortOrder::Field("name")),
            )
            .await
            .unwrap();
        let names: Vec<&str> = active.iter().filter_map(|d| d.str_field("name")).collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .insert(Collection::Inventory, body(json!({ "name": "Hammer" })))
            .await
            .unwrap();

        assert!(store.delete(Collection::Inventory, doc.id).await.unwrap());
        assert!(!store.delete(Collection::Inventory, doc.id).await.unwrap());
        assert!(store
            .find_by_id(Collection::Inventory, doc.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = MemoryDocumentStore::new();
        store.close().await;

        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
        assert!(store.find(Collection::Users, &Query::all()).await.is_err());
    }
}
