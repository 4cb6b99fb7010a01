/// Suppliers
///
/// Contact records. Every field is required at creation and independently
/// optional on update. Names are unique ignoring case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::resource::{ReadAccess, Resource, ResourceDescriptor, Unrestricted};
use crate::store::{Collection, SortOrder};
use crate::validation::validate_phone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateSupplier {
    #[validate(
        required(message = "Supplier name is required"),
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(
        required(message = "Contact name is required"),
        length(min = 2, max = 100, message = "Contact name must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[validate(
        required(message = "Phone number is required"),
        custom(function = "validate_phone", message = "Phone number format is invalid")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[validate(
        required(message = "Address is required"),
        length(min = 5, max = 500, message = "Address must be between 5 and 500 characters long")
    )]
    #[schema(min_length = 5, max_length = 500)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[validate(
        required(message = "City is required"),
        length(min = 2, max = 100, message = "City must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[validate(
        required(message = "State is required"),
        length(min = 2, max = 100, message = "State must be between 2 and 100 characters long")
    )]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[validate(
        required(message = "Zip code is required"),
        length(min = 3, max = 20, message = "Zip code must be between 3 and 20 characters long")
    )]
    #[schema(min_length = 3, max_length = 20)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateSupplier {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Contact name must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[validate(custom(function = "validate_phone", message = "Phone number format is invalid"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[validate(length(min = 5, max = 500, message = "Address must be between 5 and 500 characters long"))]
    #[schema(min_length = 5, max_length = 500)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[validate(length(min = 2, max = 100, message = "City must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[validate(length(min = 2, max = 100, message = "State must be between 2 and 100 characters long"))]
    #[schema(min_length = 2, max_length = 100)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[validate(length(min = 3, max = 20, message = "Zip code must be between 3 and 20 characters long"))]
    #[schema(min_length = 3, max_length = 20)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl Resource for Supplier {
    type Record = Supplier;
    type Create = CreateSupplier;
    type Update = UpdateSupplier;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor {
            collection: Collection::Suppliers,
            label: "Supplier",
            natural_keys: &["name"],
            ownership: Arc::new(Unrestricted),
            read_access: ReadAccess::Open,
            list_filter: None,
            sort: SortOrder::CreatedAt,
        }
    }
}
