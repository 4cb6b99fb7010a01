use std::marker::PhantomData;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{to_document, ReadAccess, Resource, ResourceDescriptor};
use crate::auth::caller::Caller;
use crate::error::{ResourceError, ResourceResult};
use crate::store::{Document, Query, SharedStore, StoredDocument};
use crate::validation::{parse_id, parse_payload};

/// The five operations of a resource, over a shared store handle
pub struct ResourceService<R: Resource> {
    store: SharedStore,
    descriptor: ResourceDescriptor,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceService<R> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            descriptor: R::descriptor(),
            _resource: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Lists records, optionally filtered by the descriptor's list filter
    ///
    /// `filter` is the raw query value; it is ignored for resources without
    /// a list filter.
    pub async fn list(&self, filter: Option<&str>) -> ResourceResult<Vec<R::Record>> {
        let mut query = Query::all();

        if let (Some(list_filter), Some(raw)) = (self.descriptor.list_filter, filter) {
            query = Query::eq(list_filter.field, list_filter.parse(raw));
        }

        let documents = self
            .store
            .find(self.descriptor.collection, &query.sorted_by(self.descriptor.sort))
            .await?;

        let mut records = documents
            .iter()
            .map(decode::<R>)
            .collect::<ResourceResult<Vec<_>>>()?;
        R::populate(self.store.as_ref(), &mut records).await?;

        Ok(records)
    }

    /// Fetches one record
    pub async fn get(&self, id: &str, caller: Option<&Caller>) -> ResourceResult<R::Record> {
        let id = parse_id(id)?;
        let document = self.load(id).await?;

        if self.descriptor.read_access == ReadAccess::Owner {
            self.descriptor.ownership.authorize(caller, &document)?;
        }

        self.populated(&document).await
    }

    /// Validates and inserts a new record
    pub async fn create(&self, payload: Value, caller: Option<&Caller>) -> ResourceResult<R::Record> {
        let input: R::Create = parse_payload(payload)?;
        let document = R::into_document(input, caller)?;

        R::before_create(self.store.as_ref(), &document, caller).await?;
        self.ensure_unique(&document, None).await?;

        let created = self
            .store
            .insert(self.descriptor.collection, document)
            .await?;

        info!(
            collection = %self.descriptor.collection,
            id = %created.id,
            caller = ?caller.map(|c| c.id),
            "{} created",
            self.descriptor.label
        );

        self.populated(&created).await
    }

    /// Merges the supplied fields into an existing record
    pub async fn update(
        &self,
        id: &str,
        payload: Value,
        caller: Option<&Caller>,
    ) -> ResourceResult<R::Record> {
        let id = parse_id(id)?;
        let changes: R::Update = parse_payload(payload)?;
        let document = to_document(&changes)?;

        if document.is_empty() {
            return Err(ResourceError::InvalidArgument(
                "No valid fields provided for update".to_string(),
            ));
        }

        let existing = self.load(id).await?;
        self.authorize(caller, &existing)?;
        R::check_update(caller, &decode::<R>(&existing)?, &changes)?;

        // Only natural keys whose value actually changes are probed.
        let changed_keys: Document = document
            .iter()
            .filter(|(field, value)| {
                self.descriptor.natural_keys.contains(&field.as_str())
                    && existing.body.get(field.as_str()) != Some(*value)
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        self.ensure_unique(&changed_keys, Some(id)).await?;

        let updated = self
            .store
            .update(self.descriptor.collection, id, document)
            .await?
            .ok_or_else(|| self.not_found())?;

        info!(
            collection = %self.descriptor.collection,
            %id,
            caller = ?caller.map(|c| c.id),
            "{} updated",
            self.descriptor.label
        );

        self.populated(&updated).await
    }

    /// Removes a record
    pub async fn delete(&self, id: &str, caller: Option<&Caller>) -> ResourceResult<()> {
        let id = parse_id(id)?;
        let existing = self.load(id).await?;

        self.authorize(caller, &existing)?;
        R::check_delete(caller, &decode::<R>(&existing)?)?;

        if !self.store.delete(self.descriptor.collection, id).await? {
            return Err(self.not_found());
        }

        info!(
            collection = %self.descriptor.collection,
            %id,
            caller = ?caller.map(|c| c.id),
            "{} deleted",
            self.descriptor.label
        );

        Ok(())
    }

    async fn load(&self, id: Uuid) -> ResourceResult<StoredDocument> {
        self.store
            .find_by_id(self.descriptor.collection, id)
            .await?
            .ok_or_else(|| self.not_found())
    }

    async fn populated(&self, document: &StoredDocument) -> ResourceResult<R::Record> {
        let mut records = [decode::<R>(document)?];
        R::populate(self.store.as_ref(), &mut records).await?;
        let [record] = records;
        Ok(record)
    }

    fn authorize(&self, caller: Option<&Caller>, document: &StoredDocument) -> ResourceResult<()> {
        self.descriptor
            .ownership
            .authorize(caller, document)
            .map_err(|e| {
                warn!(
                    collection = %self.descriptor.collection,
                    id = %document.id,
                    caller = ?caller.map(|c| c.id),
                    policy = self.descriptor.ownership.name(),
                    "Ownership check rejected"
                );
                ResourceError::from(e)
            })
    }

    async fn ensure_unique(&self, document: &Document, exclude: Option<Uuid>) -> ResourceResult<()> {
        for key in self.descriptor.natural_keys {
            let Some(Value::String(value)) = document.get(*key) else {
                continue;
            };

            let clash = self
                .store
                .find_one_ci(self.descriptor.collection, key, value, exclude)
                .await?;

            if clash.is_some() {
                warn!(
                    collection = %self.descriptor.collection,
                    field = key,
                    "Natural key conflict"
                );
                return Err(ResourceError::Conflict(format!(
                    "{} with this {} already exists",
                    self.descriptor.label, key
                )));
            }
        }

        Ok(())
    }

    fn not_found(&self) -> ResourceError {
        ResourceError::NotFound(format!("{} not found", self.descriptor.label))
    }
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            descriptor: self.descriptor.clone(),
            _resource: PhantomData,
        }
    }
}

fn decode<R: Resource>(document: &StoredDocument) -> ResourceResult<R::Record> {
    Ok(document.decode()?)
}
