/// Configuration management for the API server
///
/// Loads configuration from environment variables (and a `.env` file when
/// present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `APP_ENV`: `development` or `production` (default: development)
/// - `CORS_ORIGINS`: `*` or a comma-separated origin list (default: *)
/// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `SESSION_SECRET`: Session token signing secret, at least 32 chars (required)
/// - `SESSION_TTL_HOURS`: Session token lifetime (default: 24)
/// - `AUTH_GATE_WRITES`: Require a session for inventory/supplier writes (default: true)
/// - `BOOTSTRAP_ADMIN_USERNAME` / `BOOTSTRAP_ADMIN_EMAIL`: Admin created at
///   startup when no admin exists (optional, both or neither)
/// - `BOOTSTRAP_ADMIN_TOKEN_FILE`: File that receives the bootstrap admin's
///   session token (optional; without it the token goes to stdout outside
///   production and is withheld in production)
/// - `RUST_LOG`: Log filter (default: piem_api=debug,piem_shared=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use piem_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use piem_shared::auth::session::MIN_SECRET_LEN;
use std::env;
use std::path::PathBuf;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    pub store: StoreBackend,

    pub session: SessionConfig,

    /// Admin account ensured at startup
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Deployment environment name (`APP_ENV`)
    pub environment: String,

    /// `true` when `APP_ENV=production`: HSTS on, internal error details off
    pub production: bool,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,

    /// Whether inventory and supplier writes need a session
    pub gate_writes: bool,
}

/// Which document store to run against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { url: String, max_connections: u32 },
    Memory,
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Postgres { .. } => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Session token settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HS256 signing secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub ttl_hours: i64,
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,

    /// Where to write the new admin's session token
    pub token_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("API_HOST", "0.0.0.0");
        let port = var("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let environment = var("APP_ENV", "development");
        let production = environment.eq_ignore_ascii_case("production");

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let gate_writes = parse_bool("AUTH_GATE_WRITES", &var("AUTH_GATE_WRITES", "true"))?;

        let store = match var("STORE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => {
                let url = lookup("DATABASE_URL")
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
                let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
                    .parse::<u32>()
                    .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;
                StoreBackend::Postgres { url, max_connections }
            }
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("STORE_BACKEND must be postgres or memory, got {}", other),
        };

        let secret = lookup("SESSION_SECRET")
            .ok_or_else(|| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;

        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("SESSION_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let ttl_hours = var("SESSION_TTL_HOURS", "24")
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("SESSION_TTL_HOURS is invalid: {}", e))?;

        if ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_USERNAME"),
            lookup("BOOTSTRAP_ADMIN_EMAIL"),
        ) {
            (Some(username), Some(email)) => Some(BootstrapAdmin {
                username,
                email,
                token_file: lookup("BOOTSTRAP_ADMIN_TOKEN_FILE").map(PathBuf::from),
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_EMAIL must be set together"
            ),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                environment,
                production,
                cors_origins,
                gate_writes,
            },
            store,
            session: SessionConfig { secret, ttl_hours },
            bootstrap_admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => anyhow::bail!("{} must be true or false, got {}", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SESSION_SECRET", SECRET), ("DATABASE_URL", "postgresql://localhost/piem")]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.environment, "development");
        assert!(!config.api.production);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(config.api.gate_writes);
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                url: "postgresql://localhost/piem".to_string(),
                max_connections: 10
            }
        );
        assert_eq!(config.session.ttl(), chrono::Duration::hours(24));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = load(&[
            ("SESSION_SECRET", SECRET),
            ("STORE_BACKEND", "memory"),
            ("APP_ENV", "production"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("AUTH_GATE_WRITES", "false"),
        ])
        .unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.api.production);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.api.gate_writes);
    }

    #[test]
    fn test_required_and_invalid_values() {
        assert!(load(&[("STORE_BACKEND", "memory")]).is_err());
        assert!(load(&[("SESSION_SECRET", "short"), ("STORE_BACKEND", "memory")]).is_err());
        assert!(load(&[("SESSION_SECRET", SECRET)]).is_err());
        assert!(load(&[("SESSION_SECRET", SECRET), ("STORE_BACKEND", "mongo")]).is_err());
        assert!(load(&[
            ("SESSION_SECRET", SECRET),
            ("STORE_BACKEND", "memory"),
            ("API_PORT", "http")
        ])
        .is_err());
    }

    #[test]
    fn test_bootstrap_admin_pair() {
        let base = [("SESSION_SECRET", SECRET), ("STORE_BACKEND", "memory")];

        let mut vars = base.to_vec();
        vars.push(("BOOTSTRAP_ADMIN_USERNAME", "root"));
        assert!(load(&vars).is_err());

        vars.push(("BOOTSTRAP_ADMIN_EMAIL", "root@example.com"));
        let config = load(&vars).unwrap();
        assert_eq!(
            config.bootstrap_admin,
            Some(BootstrapAdmin {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                token_file: None,
            })
        );

        vars.push(("BOOTSTRAP_ADMIN_TOKEN_FILE", "/run/piem/admin-token"));
        let admin = load(&vars).unwrap().bootstrap_admin.unwrap();
        assert_eq!(admin.token_file, Some(PathBuf::from("/run/piem/admin-token")));
    }
}
