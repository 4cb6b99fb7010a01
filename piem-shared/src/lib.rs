//! # PIEM Shared Library
//!
//! Domain layer of the Personal Inventory & Expenses Manager API: the
//! document store gateway, resource models, validation and the generic
//! resource service, plus session tokens and authorization checks.
//!
//! ## Module Organization
//!
//! - `store`: document store trait with PostgreSQL (JSONB) and in-memory backends
//! - `db`: PostgreSQL pool and migrations behind the Postgres backend
//! - `models`: users, categories, inventory items, suppliers
//! - `resource`: the generic validated-CRUD service and its descriptors
//! - `validation`: sanitization, payload parsing, ID rule
//! - `auth`: session tokens, caller identity, authorization predicates
//! - `error`: resource error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod resource;
pub mod store;
pub mod validation;

/// Current version of the PIEM shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
