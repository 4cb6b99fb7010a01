/// Errors of the resource layer
///
/// Every failure a resource operation can produce, in the shape the API
/// maps onto status codes:
///
/// | Variant | Status |
/// |---|---|
/// | `InvalidArgument`, `Validation`, `InvalidState` | 400 |
/// | `Unauthenticated` | 401 |
/// | `Forbidden` | 403 |
/// | `NotFound` | 404 |
/// | `Conflict` | 409 |
/// | `Store` | 500 |

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::guard::AuthError;
use crate::store::StoreError;

/// Resource result type alias
pub type ResourceResult<T> = Result<T, ResourceError>;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Field name as sent by the client, or `body` for structural problems
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Malformed identifier, filter or payload shape
    #[error("{0}")]
    InvalidArgument(String),

    /// Payload failed field validation; never empty, ordered by field
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Operation not allowed in the record's current state
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// A natural key is already taken
    #[error("{0}")]
    Conflict(String),

    /// Store fault
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for ResourceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => ResourceError::Unauthenticated(err.to_string()),
            AuthError::Forbidden(message) => ResourceError::Forbidden(message),
        }
    }
}
