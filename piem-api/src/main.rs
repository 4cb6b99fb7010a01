//! # PIEM API Server
//!
//! Serves the PIEM REST API: users, categories, inventory and suppliers on
//! top of a document store (PostgreSQL JSONB, or in memory).
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` honored)
//! 2. Initialize tracing (JSON output in production)
//! 3. Open the store; for PostgreSQL, create the pool and run migrations
//! 4. Ensure the bootstrap admin, if configured
//! 5. Serve until SIGINT/SIGTERM, then close the store
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p piem-api
//! ```

use piem_api::{
    app::{build_router, AppState},
    bootstrap,
    config::{Config, StoreBackend},
};
use piem_shared::{
    db::{
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool::{create_pool, DatabaseConfig},
    },
    store::{memory::MemoryDocumentStore, postgres::PgDocumentStore, SharedStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.api.production);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.api.environment,
        backend = config.store.name(),
        "PIEM API Server starting..."
    );

    let store = open_store(&config.store).await?;
    let state = AppState::new(store.clone(), config.clone());

    if let Some(admin) = &config.bootstrap_admin {
        if let Some(created) = bootstrap::ensure_admin(&state, admin).await? {
            bootstrap::deliver_token(&created, admin, config.api.production).await?;
        }
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "piem_api=debug,piem_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(backend: &StoreBackend) -> anyhow::Result<SharedStore> {
    match backend {
        StoreBackend::Postgres { url, max_connections } => {
            ensure_database_exists(url).await?;

            let pool = create_pool(DatabaseConfig {
                url: url.clone(),
                max_connections: *max_connections,
                ..Default::default()
            })
            .await?;

            run_migrations(&pool).await?;
            let status = get_migration_status(&pool).await?;
            tracing::info!(
                applied = status.applied_migrations,
                latest = ?status.latest_version,
                "Database schema up to date"
            );

            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
