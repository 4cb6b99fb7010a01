/// Startup admin account
///
/// With `BOOTSTRAP_ADMIN_USERNAME` and `BOOTSTRAP_ADMIN_EMAIL` set, the
/// server makes sure at least one admin exists before it starts accepting
/// requests. Without an admin nobody could create users or issue sessions.
///
/// The new admin's session token never goes through tracing. It is written
/// to `BOOTSTRAP_ADMIN_TOKEN_FILE` when set, printed once to stdout outside
/// production, and withheld otherwise.

use std::fmt;
use std::path::{Path, PathBuf};

use piem_shared::auth::session::issue_session_token;
use piem_shared::models::user::{Role, User};
use piem_shared::store::{Collection, Query};
use serde_json::json;
use tracing::{info, warn};

use crate::app::AppState;
use crate::config::BootstrapAdmin;

/// Admin created at startup, with a session token for it
pub struct BootstrappedAdmin {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for BootstrappedAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrappedAdmin")
            .field("user", &self.user.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Where the bootstrap admin's token went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenDelivery {
    File(PathBuf),
    Stdout,
    Withheld,
}

/// Creates `admin` unless some admin already exists
///
/// Returns `None` when an admin was already present. The account goes
/// through the regular user rule set, so a bad username or email fails
/// startup.
pub async fn ensure_admin(
    state: &AppState,
    admin: &BootstrapAdmin,
) -> anyhow::Result<Option<BootstrappedAdmin>> {
    let existing = state
        .store
        .find(Collection::Users, &Query::eq("role", Role::Admin.as_str()))
        .await?;

    if !existing.is_empty() {
        info!(admins = existing.len(), "Admin account present, skipping bootstrap");
        return Ok(None);
    }

    let user = state
        .service::<User>()
        .create(
            json!({
                "username": admin.username,
                "email": admin.email,
                "role": Role::Admin.as_str(),
            }),
            None,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create bootstrap admin: {}", e))?;

    let (token, expires_at) =
        issue_session_token(user.id, state.session_secret(), state.config.session.ttl())?;

    info!(user_id = %user.id, %expires_at, "Bootstrap admin created");

    Ok(Some(BootstrappedAdmin { user, token }))
}

/// Hands the bootstrap admin's token to the operator
pub async fn deliver_token(
    created: &BootstrappedAdmin,
    admin: &BootstrapAdmin,
    production: bool,
) -> anyhow::Result<TokenDelivery> {
    if let Some(path) = &admin.token_file {
        write_token_file(path, &created.token).await?;
        info!(user_id = %created.user.id, path = %path.display(), "Bootstrap admin token written");
        return Ok(TokenDelivery::File(path.clone()));
    }

    if production {
        warn!(
            user_id = %created.user.id,
            "Bootstrap admin token withheld; set BOOTSTRAP_ADMIN_TOKEN_FILE to receive it"
        );
        return Ok(TokenDelivery::Withheld);
    }

    println!("Bootstrap admin session token: {}", created.token);
    Ok(TokenDelivery::Stdout)
}

async fn write_token_file(path: &Path, token: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, format!("{}\n", token))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use piem_shared::store::{memory::MemoryDocumentStore, SharedStore};
    use std::sync::Arc;

    fn state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "SESSION_SECRET" => Some("0123456789abcdef0123456789abcdef".to_string()),
            "STORE_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        AppState::new(store, config)
    }

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            username: "root".to_string(),
            email: "Root@Example.com".to_string(),
            token_file: None,
        }
    }

    #[tokio::test]
    async fn test_creates_admin_once() {
        let state = state();

        let created = ensure_admin(&state, &admin()).await.unwrap().unwrap();
        assert_eq!(created.user.role, Role::Admin);
        assert_eq!(created.user.email, "root@example.com");
        assert!(!created.token.is_empty());

        assert!(ensure_admin(&state, &admin()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_admin_fails() {
        let state = state();
        let bad = BootstrapAdmin {
            username: "r".to_string(),
            email: "not-an-email".to_string(),
            token_file: None,
        };

        assert!(ensure_admin(&state, &bad).await.is_err());
    }

    #[tokio::test]
    async fn test_token_written_to_file() {
        let state = state();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin-token");
        let admin = BootstrapAdmin {
            token_file: Some(path.clone()),
            ..admin()
        };

        let created = ensure_admin(&state, &admin).await.unwrap().unwrap();
        let delivery = deliver_token(&created, &admin, true).await.unwrap();

        assert_eq!(delivery, TokenDelivery::File(path.clone()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim_end(), created.token);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_token_withheld_in_production() {
        let state = state();
        let created = ensure_admin(&state, &admin()).await.unwrap().unwrap();

        assert_eq!(
            deliver_token(&created, &admin(), true).await.unwrap(),
            TokenDelivery::Withheld
        );
        assert_eq!(
            deliver_token(&created, &admin(), false).await.unwrap(),
            TokenDelivery::Stdout
        );
    }

    #[tokio::test]
    async fn test_debug_redacts_token() {
        let state = state();
        let created = ensure_admin(&state, &admin()).await.unwrap().unwrap();

        let debug = format!("{:?}", created);
        assert!(!debug.contains(&created.token));
        assert!(debug.contains("<redacted>"));
    }
}
