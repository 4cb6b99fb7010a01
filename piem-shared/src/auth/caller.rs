/// Resolved request identity
///
/// A `Caller` is produced by the API's session middleware from a valid
/// session token and the stored user it names. Handlers receive it as an
/// optional request extension: anonymous requests simply have none.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{Role, User};

/// The authenticated user behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Id of the user record
    pub id: Uuid,

    /// Role as stored on the user record at resolution time
    pub role: Role,
}

impl Caller {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
