use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::policy::OwnershipPolicy;
use crate::store::{Collection, SortOrder};

/// Who may read single records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAccess {
    /// Anyone
    Open,

    /// Only callers the ownership policy accepts
    Owner,
}

/// Value type of a list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Bool,
}

/// The single whitelisted equality filter a list operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    /// Query parameter name (`active`)
    pub param: &'static str,

    /// Body field it filters on (`isActive`)
    pub field: &'static str,

    pub kind: FilterKind,
}

impl ListFilter {
    /// Parses the raw query value; only the exact string `true` is true
    pub fn parse(&self, raw: &str) -> Value {
        match self.kind {
            FilterKind::Bool => Value::Bool(raw == "true"),
        }
    }
}

/// Static configuration of one resource kind
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub collection: Collection,

    /// Singular, capitalized name used in messages ("Category")
    pub label: &'static str,

    /// Fields unique under case-insensitive comparison
    pub natural_keys: &'static [&'static str],

    pub ownership: Arc<dyn OwnershipPolicy>,

    pub read_access: ReadAccess,

    pub list_filter: Option<ListFilter>,

    pub sort: SortOrder,
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("collection", &self.collection)
            .field("label", &self.label)
            .field("natural_keys", &self.natural_keys)
            .field("ownership", &self.ownership.name())
            .field("read_access", &self.read_access)
            .field("list_filter", &self.list_filter)
            .field("sort", &self.sort)
            .finish()
    }
}
