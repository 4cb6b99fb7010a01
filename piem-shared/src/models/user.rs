/// User accounts
///
/// # Document
///
/// ```json
/// {
///   "_id": "6f1c...",
///   "username": "jane",
///   "email": "jane@example.com",
///   "role": "user",
///   "createdAt": "2025-01-01T00:00:00Z",
///   "updatedAt": "2025-01-01T00:00:00Z"
/// }
/// ```
///
/// `username` and `email` are unique ignoring case. Users can read and edit
/// their own record; admins can do anything, but only admins change roles
/// and nobody deletes their own account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::caller::Caller;
use crate::error::{ResourceError, ResourceResult};
use crate::resource::{to_document, ReadAccess, Resource, ResourceDescriptor, SelfOrAdmin};
use crate::store::{Collection, Document, SortOrder};
use crate::validation::validate_role;

/// Access role of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub username: String,

    /// Always lowercase
    pub email: String,

    #[serde(default)]
    pub role: Role,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// `create` rule set
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(
        required(message = "Username is required"),
        length(min = 3, message = "Username must be at least 3 characters long")
    )]
    #[schema(min_length = 3)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Defaults to `user`
    #[validate(custom(function = "validate_role", message = "Role must be either user or admin"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// `update` rule set
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    #[schema(min_length = 3)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[validate(custom(function = "validate_role", message = "Role must be either user or admin"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Resource for User {
    type Record = User;
    type Create = CreateUser;
    type Update = UpdateUser;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor {
            collection: Collection::Users,
            label: "User",
            natural_keys: &["username", "email"],
            ownership: std::sync::Arc::new(SelfOrAdmin),
            read_access: ReadAccess::Owner,
            list_filter: None,
            sort: SortOrder::CreatedAt,
        }
    }

    fn into_document(input: CreateUser, _caller: Option<&Caller>) -> ResourceResult<Document> {
        let mut document = to_document(&input)?;
        document
            .entry("role")
            .or_insert_with(|| Role::default().as_str().into());
        Ok(document)
    }

    fn check_update(caller: Option<&Caller>, existing: &User, changes: &UpdateUser) -> ResourceResult<()> {
        let role_changes = changes
            .role
            .as_deref()
            .is_some_and(|role| role != existing.role.as_str());

        if role_changes && !caller.is_some_and(Caller::is_admin) {
            return Err(ResourceError::Forbidden(
                "Only admins can change user roles".to_string(),
            ));
        }

        Ok(())
    }

    fn check_delete(caller: Option<&Caller>, existing: &User) -> ResourceResult<()> {
        if caller.is_some_and(|c| c.id == existing.id) {
            return Err(ResourceError::InvalidArgument(
                "You cannot delete your own account".to_string(),
            ));
        }

        Ok(())
    }
}
