/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`session`]: HS256 session token issuance and validation
/// - [`caller`]: the resolved identity attached to a request
/// - [`guard`]: `authenticated` / `has_role` / `self_or_admin` predicates
///
/// Session tokens only name a user; roles always come from the stored user
/// record, looked up by the API's session middleware.

pub mod caller;
pub mod guard;
pub mod session;
