/// Categories
///
/// Created by an authenticated user, who becomes the owner (`createdBy`).
/// Returned records carry the creator's `_id`, `username` and `email`;
/// if that user has been deleted only the id remains.
/// Names are unique ignoring case. A category that still counts items
/// (`itemCount > 0`) cannot be deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::caller::Caller;
use crate::auth::guard;
use crate::error::{ResourceError, ResourceResult};
use crate::resource::{
    to_document, CreatorOrAdmin, FilterKind, ListFilter, ReadAccess, Resource, ResourceDescriptor,
};
use crate::store::{Collection, Document, DocumentStore, SortOrder};

/// Owner field of a category document
pub const CREATED_BY_FIELD: &str = "createdBy";

/// Stored category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub created_by: CreatedBy,

    #[serde(default)]
    pub item_count: i64,

    #[serde(default = "default_active")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Creator of a category, as stored (id) or resolved against the users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CreatedBy {
    User(Creator),
    Id(Uuid),
}

impl CreatedBy {
    pub fn id(&self) -> Uuid {
        match self {
            CreatedBy::User(creator) => creator.id,
            CreatedBy::Id(id) => *id,
        }
    }
}

/// Public fields of the creating user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Creator {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub username: String,

    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateCategory {
    #[validate(
        required(message = "Category name is required"),
        length(min = 2, max = 50, message = "Category name must be between 2 and 50 characters")
    )]
    #[schema(min_length = 2, max_length = 50)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[schema(max_length = 200)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateCategory {
    #[validate(length(min = 2, max = 50, message = "Category name must be between 2 and 50 characters"))]
    #[schema(min_length = 2, max_length = 50)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[schema(max_length = 200)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[validate(range(min = 0, message = "Item count must be a non-negative integer"))]
    #[schema(minimum = 0)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
}

#[async_trait]
impl Resource for Category {
    type Record = Category;
    type Create = CreateCategory;
    type Update = UpdateCategory;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor {
            collection: Collection::Categories,
            label: "Category",
            natural_keys: &["name"],
            ownership: Arc::new(CreatorOrAdmin {
                field: CREATED_BY_FIELD,
            }),
            read_access: ReadAccess::Open,
            list_filter: Some(ListFilter {
                param: "active",
                field: "isActive",
                kind: FilterKind::Bool,
            }),
            sort: SortOrder::Field("name"),
        }
    }

    fn into_document(input: CreateCategory, caller: Option<&Caller>) -> ResourceResult<Document> {
        let caller = guard::authenticated(caller)?;

        let mut document = to_document(&input)?;
        document.entry("description").or_insert_with(|| "".into());
        document.entry("isActive").or_insert(Value::Bool(true));
        document.insert("itemCount".to_string(), Value::from(0));
        document.insert(CREATED_BY_FIELD.to_string(), caller.id.to_string().into());
        Ok(document)
    }

    async fn before_create(
        store: &dyn DocumentStore,
        _document: &Document,
        caller: Option<&Caller>,
    ) -> ResourceResult<()> {
        let caller = guard::authenticated(caller)?;

        if store.find_by_id(Collection::Users, caller.id).await?.is_none() {
            return Err(ResourceError::InvalidArgument(
                "Creator must reference an existing user".to_string(),
            ));
        }

        Ok(())
    }

    async fn populate(store: &dyn DocumentStore, records: &mut [Category]) -> ResourceResult<()> {
        let mut creators: HashMap<Uuid, Option<Creator>> = HashMap::new();

        for record in records.iter_mut() {
            let id = record.created_by.id();

            if !creators.contains_key(&id) {
                let user = store.find_by_id(Collection::Users, id).await?;
                let creator = user.as_ref().and_then(|user| {
                    Some(Creator {
                        id,
                        username: user.str_field("username")?.to_string(),
                        email: user.str_field("email")?.to_string(),
                    })
                });
                creators.insert(id, creator);
            }

            record.created_by = match creators.get(&id) {
                Some(Some(creator)) => CreatedBy::User(creator.clone()),
                _ => CreatedBy::Id(id),
            };
        }

        Ok(())
    }

    fn check_delete(_caller: Option<&Caller>, existing: &Category) -> ResourceResult<()> {
        if existing.item_count > 0 {
            return Err(ResourceError::InvalidState(
                "Cannot delete category with existing items".to_string(),
            ));
        }

        Ok(())
    }
}
