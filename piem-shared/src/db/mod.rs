/// PostgreSQL plumbing for the document store
///
/// - `pool`: connection pool creation, health check and shutdown
/// - `migrations`: embedded schema migrations
///
/// The document operations themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
