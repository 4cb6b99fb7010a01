/// Ownership policies
///
/// Decide whether a caller may modify (and, for owner-read resources, read)
/// a stored record. Each resource names its policy in its descriptor.

use std::fmt;

use crate::auth::caller::Caller;
use crate::auth::guard::{self, AuthError};
use crate::store::StoredDocument;

pub trait OwnershipPolicy: fmt::Debug + Send + Sync {
    /// Short name used in logs and the API description
    fn name(&self) -> &'static str;

    /// `Ok` when `caller` may act on `record`
    fn authorize(&self, caller: Option<&Caller>, record: &StoredDocument) -> Result<(), AuthError>;
}

/// Anyone may act, authenticated or not
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl OwnershipPolicy for Unrestricted {
    fn name(&self) -> &'static str {
        "unrestricted"
    }

    fn authorize(&self, _caller: Option<&Caller>, _record: &StoredDocument) -> Result<(), AuthError> {
        Ok(())
    }
}

/// The record is the caller's own user record, or the caller is an admin
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfOrAdmin;

impl OwnershipPolicy for SelfOrAdmin {
    fn name(&self) -> &'static str {
        "self-or-admin"
    }

    fn authorize(&self, caller: Option<&Caller>, record: &StoredDocument) -> Result<(), AuthError> {
        guard::self_or_admin(caller, record.id).map(|_| ())
    }
}

/// The caller's id is stored in `field`, or the caller is an admin
#[derive(Debug, Clone, Copy)]
pub struct CreatorOrAdmin {
    pub field: &'static str,
}

impl OwnershipPolicy for CreatorOrAdmin {
    fn name(&self) -> &'static str {
        "creator-or-admin"
    }

    fn authorize(&self, caller: Option<&Caller>, record: &StoredDocument) -> Result<(), AuthError> {
        let caller = guard::authenticated(caller)?;
        if caller.is_admin() {
            return Ok(());
        }

        let is_creator = record
            .str_field(self.field)
            .and_then(|raw| raw.parse::<uuid::Uuid>().ok())
            .is_some_and(|creator| creator == caller.id);

        if is_creator {
            Ok(())
        } else {
            Err(AuthError::Forbidden(
                "Only the creator or an admin can modify this record".to_string(),
            ))
        }
    }
}
