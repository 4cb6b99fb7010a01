/// Inventory items
///
/// Open resource: no owner, names unique ignoring case. `category` and
/// `supplier` are free-text labels, not references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::caller::Caller;
use crate::error::ResourceResult;
use crate::resource::{to_document, ReadAccess, Resource, ResourceDescriptor, Unrestricted};
use crate::store::{Collection, Document, SortOrder};
use crate::validation::validate_inventory_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum StockStatus {
    Available,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

/// Stored inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub name: String,

    pub category: String,

    pub quantity: i64,

    #[serde(default)]
    pub description: String,

    pub price: f64,

    pub status: StockStatus,

    pub supplier: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateInventoryItem {
    #[validate(
        required(message = "Name is required"),
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(
        required(message = "Category is required"),
        length(min = 2, max = 100, message = "Category must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[validate(
        required(message = "Quantity is required"),
        range(min = 0, message = "Quantity must be a non-negative integer")
    )]
    #[schema(minimum = 0)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,

    #[validate(length(max = 500, message = "Description must be less than or equal to 500 characters"))]
    #[schema(max_length = 500)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[validate(
        required(message = "Price is required"),
        range(min = 0.0, message = "Price must be a non-negative number")
    )]
    #[schema(minimum = 0.0)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[validate(
        required(message = "Status is required"),
        custom(
            function = "validate_inventory_status",
            message = "Status must be one of Available or Out of Stock"
        )
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[validate(
        required(message = "Supplier is required"),
        length(min = 2, max = 100, message = "Supplier name must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateInventoryItem {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    #[schema(minimum = 0)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,

    #[validate(length(max = 500, message = "Description must be less than or equal to 500 characters"))]
    #[schema(max_length = 500)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    #[schema(minimum = 0.0)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[validate(custom(
        function = "validate_inventory_status",
        message = "Status must be one of Available or Out of Stock"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Supplier name must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

impl Resource for InventoryItem {
    type Record = InventoryItem;
    type Create = CreateInventoryItem;
    type Update = UpdateInventoryItem;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor {
            collection: Collection::Inventory,
            label: "Inventory item",
            natural_keys: &["name"],
            ownership: Arc::new(Unrestricted),
            read_access: ReadAccess::Open,
            list_filter: None,
            sort: SortOrder::CreatedAt,
        }
    }

    fn into_document(input: CreateInventoryItem, _caller: Option<&Caller>) -> ResourceResult<Document> {
        let mut document = to_document(&input)?;
        document.entry("description").or_insert_with(|| "".into());
        Ok(document)
    }
}
