/// Generic CRUD endpoints
///
/// Every resource is mounted the same way:
///
/// ```text
/// GET    /<base>        list   200 { success, count, data }
/// POST   /<base>        create 201 { success, message, data }
/// GET    /<base>/:id    get    200 { success, data }
/// PUT    /<base>/:id    update 200 { success, message, data }
/// DELETE /<base>/:id    delete 200 { success, message }
/// ```
///
/// Handlers only translate HTTP into [`ResourceService`] calls; which
/// methods need a session is decided per method by [`ResourceGates`].

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, post, put, MethodRouter},
    Extension, Json, Router,
};
use piem_shared::auth::caller::Caller;
use piem_shared::resource::{Resource, ResourceService};
use piem_shared::validation::parse_id;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::session::{require_admin, require_authenticated};

/// Session requirement of one route method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Authenticated,
    Admin,
}

impl Gate {
    fn apply(self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        match self {
            Gate::Open => route,
            Gate::Authenticated => route.route_layer(from_fn(require_authenticated)),
            Gate::Admin => route.route_layer(from_fn(require_admin)),
        }
    }
}

/// Gate per operation of a resource
#[derive(Debug, Clone, Copy)]
pub struct ResourceGates {
    pub list: Gate,
    pub get: Gate,
    pub create: Gate,
    pub update: Gate,
    pub delete: Gate,
}

impl ResourceGates {
    /// Users: the service narrows get/update to self-or-admin
    pub const USERS: Self = Self {
        list: Gate::Admin,
        get: Gate::Authenticated,
        create: Gate::Admin,
        update: Gate::Authenticated,
        delete: Gate::Admin,
    };

    /// Inventory and suppliers, per `AUTH_GATE_WRITES`
    pub fn configurable(gate_writes: bool) -> Self {
        Self::writes(if gate_writes { Gate::Authenticated } else { Gate::Open })
    }

    /// Open reads, gated writes
    pub fn writes(gate: Gate) -> Self {
        Self {
            list: Gate::Open,
            get: Gate::Open,
            create: gate,
            update: gate,
            delete: gate,
        }
    }
}

/// Mounts the five operations of `R` under `base`
pub fn resource_routes<R: Resource>(base: &str, gates: ResourceGates) -> Router<AppState> {
    let collection = gates
        .list
        .apply(get(list::<R>))
        .merge(gates.create.apply(post(create::<R>)));

    let item = gates
        .get
        .apply(get(fetch::<R>))
        .merge(gates.update.apply(put(update::<R>)))
        .merge(gates.delete.apply(delete(remove::<R>)));

    Router::new()
        .route(base, collection)
        .route(&format!("{}/:id", base), item)
}

type Params = Result<Query<HashMap<String, String>>, QueryRejection>;
type Body = Result<Json<Value>, JsonRejection>;

fn caller(extension: &Option<Extension<Caller>>) -> Option<&Caller> {
    extension.as_ref().map(|Extension(caller)| caller)
}

async fn list<R: Resource>(State(state): State<AppState>, params: Params) -> ApiResult<Json<Value>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let service: ResourceService<R> = state.service();

    let filter = service
        .descriptor()
        .list_filter
        .and_then(|filter| params.get(filter.param))
        .map(String::as_str);

    let records = service.list(filter).await?;

    Ok(Json(json!({
        "success": true,
        "count": records.len(),
        "data": records,
    })))
}

async fn fetch<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    extension: Option<Extension<Caller>>,
) -> ApiResult<Json<Value>> {
    let record = state
        .service::<R>()
        .get(&id, caller(&extension))
        .await?;

    Ok(Json(json!({ "success": true, "data": record })))
}

async fn create<R: Resource>(
    State(state): State<AppState>,
    extension: Option<Extension<Caller>>,
    body: Body,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(payload) = body?;
    let service: ResourceService<R> = state.service();

    let record = service.create(payload, caller(&extension)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("{} created successfully", service.descriptor().label),
            "data": record,
        })),
    ))
}

async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    extension: Option<Extension<Caller>>,
    body: Body,
) -> ApiResult<Json<Value>> {
    // A malformed id wins over a malformed body.
    parse_id(&id)?;
    let Json(payload) = body?;
    let service: ResourceService<R> = state.service();

    let record = service.update(&id, payload, caller(&extension)).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} updated successfully", service.descriptor().label),
        "data": record,
    })))
}

async fn remove<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    extension: Option<Extension<Caller>>,
) -> ApiResult<Json<Value>> {
    let service: ResourceService<R> = state.service();
    service.delete(&id, caller(&extension)).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} deleted successfully", service.descriptor().label),
    })))
}
