/// Middleware modules for the API server
///
/// - `security`: security response headers
/// - `session`: session token resolution and authorization gates
/// - `errors`: internal error details for non-production builds

pub mod errors;
pub mod security;
pub mod session;
