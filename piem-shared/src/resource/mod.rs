/// Generic validated-CRUD resources
///
/// A resource kind is described once, by implementing [`Resource`]:
///
/// - the record type returned to clients,
/// - the `create` and `update` input types, whose `validator` rules are the
///   resource's rule sets,
/// - a [`ResourceDescriptor`] (collection, natural keys, ownership policy,
///   read access, list filter, sort order),
/// - optional hooks for the rules that are specific to the resource, and
///   for filling in referenced records before they are returned.
///
/// [`ResourceService`] then runs list / get / create / update / delete for
/// any resource the same way.
///
/// # Example
///
/// ```no_run
/// use piem_shared::models::category::Category;
/// use piem_shared::resource::ResourceService;
/// use piem_shared::store::{memory::MemoryDocumentStore, SharedStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: SharedStore = Arc::new(MemoryDocumentStore::new());
/// let categories = ResourceService::<Category>::new(store);
///
/// let active = categories.list(Some("true")).await?;
/// # Ok(())
/// # }
/// ```

pub mod descriptor;
pub mod policy;
pub mod service;

pub use descriptor::{FilterKind, ListFilter, ReadAccess, ResourceDescriptor};
pub use policy::{CreatorOrAdmin, OwnershipPolicy, SelfOrAdmin, Unrestricted};
pub use service::ResourceService;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::auth::caller::Caller;
use crate::error::{ResourceError, ResourceResult};
use crate::store::{Document, DocumentStore};

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Record as returned to clients, including `_id` and timestamps
    type Record: DeserializeOwned + Serialize + Send + Sync;

    /// `create` rule set; required fields are `Option`s marked `required`
    type Create: DeserializeOwned + Serialize + Validate + Send + Sync;

    /// `update` rule set; every field optional
    type Update: DeserializeOwned + Serialize + Validate + Send + Sync;

    fn descriptor() -> ResourceDescriptor;

    /// Builds the body to insert, applying server-side defaults
    fn into_document(input: Self::Create, _caller: Option<&Caller>) -> ResourceResult<Document> {
        to_document(&input)
    }

    /// Runs after validation and before the uniqueness probe
    async fn before_create(
        _store: &dyn DocumentStore,
        _document: &Document,
        _caller: Option<&Caller>,
    ) -> ResourceResult<()> {
        Ok(())
    }

    /// Resolves references in records about to be returned
    async fn populate(_store: &dyn DocumentStore, _records: &mut [Self::Record]) -> ResourceResult<()> {
        Ok(())
    }

    /// Runs after the ownership check of an update
    fn check_update(
        _caller: Option<&Caller>,
        _existing: &Self::Record,
        _changes: &Self::Update,
    ) -> ResourceResult<()> {
        Ok(())
    }

    /// Runs after the ownership check of a delete
    fn check_delete(_caller: Option<&Caller>, _existing: &Self::Record) -> ResourceResult<()> {
        Ok(())
    }
}

/// Serializes an input struct into a document body
///
/// Inputs skip `None` fields, so the result only holds what the client sent.
pub fn to_document<T: Serialize>(input: &T) -> ResourceResult<Document> {
    match serde_json::to_value(input) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(ResourceError::InvalidArgument(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ResourceError::InvalidArgument(e.to_string())),
    }
}
