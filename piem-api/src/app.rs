/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use piem_api::{app::{build_router, AppState}, config::Config};
/// use piem_shared::store::{memory::MemoryDocumentStore, SharedStore};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store: SharedStore = Arc::new(MemoryDocumentStore::new());
/// let app = build_router(AppState::new(store, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{errors::expose_error_details, security::SecurityHeadersLayer, session},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use piem_shared::models::{
    category::Category, inventory::InventoryItem, supplier::Supplier, user::User,
};
use piem_shared::resource::{Resource, ResourceService};
use piem_shared::store::SharedStore;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::routes::resources::{resource_routes, Gate, ResourceGates};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. The store
/// handle is process-wide: created once in `main`, closed at shutdown.
#[derive(Clone)]
pub struct AppState {
    /// Document store
    pub store: SharedStore,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Secret for session token operations
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }

    /// Resource service over the shared store
    pub fn service<R: Resource>(&self) -> ResourceService<R> {
        ResourceService::new(self.store.clone())
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /                       # Status (public)
/// ├── GET  /health                 # Health check (public)
/// ├── GET  /api-docs/openapi.json  # API description (public)
/// ├── /auth
/// │   ├── GET  /session            # Current caller (authenticated)
/// │   └── POST /sessions           # Issue a session token (admin)
/// ├── /users[/:id]                 # list/create/delete admin, get/update authenticated
/// ├── /categories[/:id]            # reads public, writes authenticated
/// ├── /inventory[/:id]             # reads public, writes gated by AUTH_GATE_WRITES
/// └── /supplier[/:id]              # reads public, writes gated by AUTH_GATE_WRITES
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Compression
/// 4. Logging (tower-http TraceLayer)
/// 5. Panic recovery (500 envelope)
/// 6. Internal error details (non-production)
/// 7. Session resolution
/// 8. Authorization gates (per route and method)
pub fn build_router(state: AppState) -> Router {
    let inventory_gates = ResourceGates::configurable(state.config.api.gate_writes);

    let users = resource_routes::<User>("/users", ResourceGates::USERS);
    let categories = resource_routes::<Category>("/categories", ResourceGates::writes(Gate::Authenticated));
    let inventory = resource_routes::<InventoryItem>("/inventory", inventory_gates);
    let suppliers = resource_routes::<Supplier>("/supplier", inventory_gates);

    let auth_routes = Router::new()
        .route(
            "/auth/session",
            get(routes::auth::current_session).route_layer(from_fn(session::require_authenticated)),
        )
        .route(
            "/auth/sessions",
            post(routes::auth::issue_session).route_layer(from_fn(session::require_admin)),
        );

    let public_routes = Router::new()
        .route("/", get(routes::health::status))
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(routes::docs::openapi_json));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(users)
        .merge(categories)
        .merge(inventory)
        .merge(suppliers)
        .fallback(routes::not_found)
        .layer(from_fn_with_state(state.clone(), session::resolve_session))
        .layer(from_fn_with_state(state.clone(), expose_error_details))
        .layer(CatchPanicLayer::custom(routes::panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
