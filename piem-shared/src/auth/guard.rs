/// Authorization predicates
///
/// Pure checks over an optional [`Caller`]. The API crate layers them onto
/// routes; the resource service and ownership policies reuse them so a
/// rejection reads the same wherever it happens.
///
/// | Check | No caller | Caller lacks permission |
/// |---|---|---|
/// | [`authenticated`] | `Unauthenticated` | n/a |
/// | [`has_role`] | `Unauthenticated` | `Forbidden` |
/// | [`self_or_admin`] | `Unauthenticated` | `Forbidden` |
///
/// # Example
///
/// ```
/// use piem_shared::auth::caller::Caller;
/// use piem_shared::auth::guard::{authenticated, has_role};
/// use piem_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let caller = Caller::new(Uuid::new_v4(), Role::User);
/// assert!(authenticated(Some(&caller)).is_ok());
/// assert!(has_role(Some(&caller), Role::Admin).is_err());
/// ```

use uuid::Uuid;

use super::caller::Caller;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No resolved caller
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is known but not permitted
    #[error("{0}")]
    Forbidden(String),
}

/// Passes when a caller has been resolved
pub fn authenticated(caller: Option<&Caller>) -> Result<&Caller, AuthError> {
    caller.ok_or(AuthError::Unauthenticated)
}

/// Passes when the caller holds `role`; admins satisfy every role
pub fn has_role(caller: Option<&Caller>, role: Role) -> Result<&Caller, AuthError> {
    let caller = authenticated(caller)?;

    if caller.role == role || caller.is_admin() {
        Ok(caller)
    } else {
        Err(AuthError::Forbidden(format!(
            "Access denied: {} role required",
            role.as_str()
        )))
    }
}

/// Passes when the caller is `owner_id` or an admin
pub fn self_or_admin(caller: Option<&Caller>, owner_id: Uuid) -> Result<&Caller, AuthError> {
    let caller = authenticated(caller)?;

    if caller.id == owner_id || caller.is_admin() {
        Ok(caller)
    } else {
        Err(AuthError::Forbidden(
            "You are not authorized to access this resource".to_string(),
        ))
    }
}
