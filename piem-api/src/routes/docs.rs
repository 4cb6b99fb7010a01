/// OpenAPI document
///
/// `GET /api-docs/openapi.json` serves an OpenAPI 3.0 description of the
/// API, assembled with utoipa's builders. Component schemas are derived from
/// the models (`ToSchema`); paths, labels, filters and security requirements
/// come from the same descriptors and gates the router is built from.

use axum::{extract::State, Json};
use piem_shared::error::FieldError;
use piem_shared::models::{
    category::{Category, CreatedBy, Creator},
    inventory::{InventoryItem, StockStatus},
    supplier::Supplier,
    user::{Role, User},
};
use piem_shared::resource::{Resource, ResourceDescriptor};
use utoipa::openapi::{
    path::{OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder},
    request_body::RequestBodyBuilder,
    schema::{ArrayBuilder, KnownFormat, ObjectBuilder, SchemaFormat, SchemaType},
    security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme},
    ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathItemType,
    PathsBuilder, Ref, RefOr, Required, Response, ResponseBuilder, Schema,
};
use utoipa::ToSchema;

use super::auth::{IssueSessionRequest, SessionToken};
use super::resources::{Gate, ResourceGates};
use crate::app::AppState;
use crate::config::ApiConfig;
use crate::error::ErrorResponse;

const JSON: &str = "application/json";
const BEARER: &str = "bearerAuth";

/// One documented resource
struct Documented {
    base: &'static str,
    /// Component names of the record and its inputs
    record: &'static str,
    create: &'static str,
    update: &'static str,
    descriptor: ResourceDescriptor,
    gates: ResourceGates,
    /// Required at creation
    required: &'static [&'static str],
    /// Adds the record and input schemas to the components
    register: fn(ComponentsBuilder, &'static [&'static str]) -> ComponentsBuilder,
}

impl Documented {
    fn of<R>(base: &'static str, gates: ResourceGates, required: &'static [&'static str]) -> Self
    where
        R: Resource,
        R::Record: for<'s> ToSchema<'s>,
        R::Create: for<'s> ToSchema<'s>,
        R::Update: for<'s> ToSchema<'s>,
    {
        Self {
            base,
            record: <R::Record as ToSchema<'static>>::schema().0,
            create: <R::Create as ToSchema<'static>>::schema().0,
            update: <R::Update as ToSchema<'static>>::schema().0,
            descriptor: R::descriptor(),
            gates,
            required,
            register: register_schemas::<R>,
        }
    }
}

fn register_schemas<R>(
    components: ComponentsBuilder,
    required: &'static [&'static str],
) -> ComponentsBuilder
where
    R: Resource,
    R::Record: for<'s> ToSchema<'s>,
    R::Create: for<'s> ToSchema<'s>,
    R::Update: for<'s> ToSchema<'s>,
{
    // Inputs are all `Option`s; the rule sets decide what is required.
    let (create, mut create_schema) = <R::Create as ToSchema>::schema();
    if let RefOr::T(Schema::Object(object)) = &mut create_schema {
        object.required = required.iter().map(|field| field.to_string()).collect();
    }

    let (update, mut update_schema) = <R::Update as ToSchema>::schema();
    if let RefOr::T(Schema::Object(object)) = &mut update_schema {
        object.min_properties = Some(1);
    }

    components
        .schema_from::<R::Record>()
        .schema(create, create_schema)
        .schema(update, update_schema)
}

fn documented(config: &ApiConfig) -> Vec<Documented> {
    let inventory_gates = ResourceGates::configurable(config.gate_writes);

    vec![
        Documented::of::<User>("/users", ResourceGates::USERS, &["username", "email"]),
        Documented::of::<Category>(
            "/categories",
            ResourceGates::writes(Gate::Authenticated),
            &["name"],
        ),
        Documented::of::<InventoryItem>(
            "/inventory",
            inventory_gates,
            &["name", "category", "quantity", "price", "status", "supplier"],
        ),
        Documented::of::<Supplier>(
            "/supplier",
            inventory_gates,
            &["name", "contactName", "email", "phone", "address", "city", "state", "zipCode"],
        ),
    ]
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn object(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

fn typed(schema_type: SchemaType) -> RefOr<Schema> {
    object(ObjectBuilder::new().schema_type(schema_type))
}

fn uuid_string() -> RefOr<Schema> {
    object(
        ObjectBuilder::new()
            .schema_type(SchemaType::String)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Uuid))),
    )
}

fn json_body(description: &str, schema: RefOr<Schema>) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content(JSON, ContentBuilder::new().schema(schema).build())
        .build()
}

fn error_response(description: &str) -> Response {
    json_body(description, schema_ref("ErrorResponse"))
}

/// `{ success, message, count, data }`, with `data` left out when absent
fn envelope(description: &str, data: Option<RefOr<Schema>>) -> Response {
    let mut schema = ObjectBuilder::new()
        .property("success", typed(SchemaType::Boolean))
        .property("message", typed(SchemaType::String))
        .property("count", typed(SchemaType::Integer))
        .required("success");

    if let Some(data) = data {
        schema = schema.property("data", data);
    }

    json_body(description, object(schema))
}

/// Adds the security requirement and 401/403 responses a gate implies
fn gated(operation: OperationBuilder, gate: Gate) -> OperationBuilder {
    match gate {
        Gate::Open => operation,
        Gate::Authenticated => operation
            .security(SecurityRequirement::new(BEARER, Vec::<String>::new()))
            .response("401", error_response("Authentication required")),
        Gate::Admin => operation
            .security(SecurityRequirement::new(BEARER, Vec::<String>::new()))
            .response("401", error_response("Authentication required"))
            .response("403", error_response("Admin role required")),
    }
}

fn operation(tag: &str, summary: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new()
        .tags(Some(vec![tag.to_string()]))
        .summary(Some(summary))
}

fn request_body(schema: RefOr<Schema>) -> RequestBodyBuilder {
    RequestBodyBuilder::new()
        .content(JSON, ContentBuilder::new().schema(schema).build())
        .required(Some(Required::True))
}

fn resource_paths(resource: &Documented, paths: PathsBuilder) -> PathsBuilder {
    let descriptor = &resource.descriptor;
    let label = descriptor.label;
    let noun = label.to_lowercase();
    let tag = descriptor.collection.name();
    let ownership = format!("Allowed for: {}", descriptor.ownership.name());
    let not_found = format!("{} not found", label);
    let conflict = format!(
        "A record with the same {} exists (ignoring case)",
        descriptor.natural_keys.join(" or ")
    );
    let id_param = || {
        ParameterBuilder::new()
            .name("id")
            .parameter_in(ParameterIn::Path)
            .required(Required::True)
            .schema(Some(uuid_string()))
            .build()
    };

    let mut list = operation(tag, format!("List {}", tag)).response(
        "200",
        envelope(
            "Records",
            Some(RefOr::T(Schema::Array(
                ArrayBuilder::new().items(schema_ref(resource.record)).build(),
            ))),
        ),
    );
    if let Some(filter) = descriptor.list_filter {
        list = list.parameter(
            ParameterBuilder::new()
                .name(filter.param)
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .description(Some(format!(
                    "`true` lists records whose {} is true; any other value lists the rest",
                    filter.field
                )))
                .schema(Some(typed(SchemaType::String))),
        );
    }

    let create = operation(tag, format!("Create a {}", noun))
        .request_body(Some(request_body(schema_ref(resource.create)).build()))
        .response("201", envelope("Created", Some(schema_ref(resource.record))))
        .response("400", error_response("Validation failed"))
        .response("409", error_response(&conflict));

    let get = operation(tag, format!("Get a {}", noun))
        .parameter(id_param())
        .response("200", envelope("Record", Some(schema_ref(resource.record))))
        .response("400", error_response("Invalid ID format"))
        .response("404", error_response(&not_found));

    let update = operation(tag, format!("Update a {}", noun))
        .description(Some(ownership.clone()))
        .parameter(id_param())
        .request_body(Some(request_body(schema_ref(resource.update)).build()))
        .response("200", envelope("Updated", Some(schema_ref(resource.record))))
        .response(
            "400",
            error_response("Invalid ID, validation failed or no fields provided"),
        )
        .response("404", error_response(&not_found))
        .response("409", error_response(&conflict));

    let delete = operation(tag, format!("Delete a {}", noun))
        .description(Some(ownership))
        .parameter(id_param())
        .response("200", envelope("Deleted", None))
        .response(
            "400",
            error_response("Invalid ID format or record cannot be deleted"),
        )
        .response("404", error_response(&not_found));

    let gates = resource.gates;

    paths
        .path(
            resource.base,
            PathItemBuilder::new()
                .operation(PathItemType::Get, gated(list, gates.list).build())
                .operation(PathItemType::Post, gated(create, gates.create).build())
                .build(),
        )
        .path(
            format!("{}/{{id}}", resource.base),
            PathItemBuilder::new()
                .operation(PathItemType::Get, gated(get, gates.get).build())
                .operation(PathItemType::Put, gated(update, gates.update).build())
                .operation(PathItemType::Delete, gated(delete, gates.delete).build())
                .build(),
        )
}

fn system_paths(paths: PathsBuilder) -> PathsBuilder {
    let health = operation("system", "Health check")
        .response("200", ResponseBuilder::new().description("Service health").build());

    let session = gated(
        operation("auth", "Current session user")
            .response("200", envelope("User", Some(schema_ref("User")))),
        Gate::Authenticated,
    );

    let issue = gated(
        operation("auth", "Issue a session token")
            .request_body(Some(request_body(schema_ref("IssueSessionRequest")).build()))
            .response("201", envelope("Token", Some(schema_ref("SessionToken"))))
            .response("400", error_response("Invalid ID format"))
            .response("404", error_response("User not found")),
        Gate::Admin,
    );

    paths
        .path(
            "/health",
            PathItemBuilder::new()
                .operation(PathItemType::Get, health.build())
                .build(),
        )
        .path(
            "/auth/session",
            PathItemBuilder::new()
                .operation(PathItemType::Get, session.build())
                .build(),
        )
        .path(
            "/auth/sessions",
            PathItemBuilder::new()
                .operation(PathItemType::Post, issue.build())
                .build(),
        )
}

/// Builds the OpenAPI document for the running configuration
pub fn openapi_document(config: &ApiConfig) -> OpenApi {
    let mut paths = system_paths(PathsBuilder::new());
    let mut components = ComponentsBuilder::new()
        .schema_from::<Role>()
        .schema_from::<StockStatus>()
        .schema_from::<CreatedBy>()
        .schema_from::<Creator>()
        .schema_from::<FieldError>()
        .schema_from::<ErrorResponse>()
        .schema_from::<IssueSessionRequest>()
        .schema_from::<SessionToken>()
        .security_scheme(
            BEARER,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    for resource in documented(config) {
        paths = resource_paths(&resource, paths);
        components = (resource.register)(components, resource.required);
    }

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title("PIEM API")
                .description(Some("Personal Inventory & Expenses Manager"))
                .version(piem_shared::VERSION)
                .build(),
        )
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}

/// OpenAPI document handler
pub async fn openapi_json(State(state): State<AppState>) -> Json<OpenApi> {
    Json(openapi_document(&state.config.api))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::{json, Value};

    fn document(gate_writes: bool) -> Value {
        let secret = "0123456789abcdef0123456789abcdef";
        let gate = gate_writes.to_string();
        let api = Config::from_lookup(|key| match key {
            "SESSION_SECRET" => Some(secret.to_string()),
            "STORE_BACKEND" => Some("memory".to_string()),
            "AUTH_GATE_WRITES" => Some(gate.clone()),
            _ => None,
        })
        .unwrap()
        .api;

        serde_json::to_value(openapi_document(&api)).unwrap()
    }

    #[test]
    fn test_document_lists_every_resource() {
        let doc = document(true);

        for path in ["/users", "/users/{id}", "/categories", "/inventory", "/supplier/{id}"] {
            assert!(doc["paths"].get(path).is_some(), "missing {}", path);
        }
        assert_eq!(doc["openapi"], "3.0.3");
        assert_eq!(doc["info"]["version"], piem_shared::VERSION);
        assert_eq!(doc["components"]["schemas"]["CreateCategory"]["required"], json!(["name"]));
        assert_eq!(doc["components"]["schemas"]["UpdateSupplier"]["minProperties"], 1);
        assert_eq!(
            doc["components"]["securitySchemes"]["bearerAuth"]["scheme"],
            "bearer"
        );
    }

    #[test]
    fn test_security_follows_gates() {
        let doc = document(true);
        assert!(doc["paths"]["/categories"]["get"].get("security").is_none());
        assert!(doc["paths"]["/categories"]["post"].get("security").is_some());
        assert!(doc["paths"]["/users"]["get"]["responses"].get("403").is_some());
        assert!(doc["paths"]["/inventory"]["post"].get("security").is_some());

        let open = document(false);
        assert!(open["paths"]["/inventory"]["post"].get("security").is_none());
    }

    #[test]
    fn test_category_list_documents_filter() {
        let doc = document(true);
        assert_eq!(doc["paths"]["/categories"]["get"]["parameters"][0]["name"], "active");
        assert!(doc["paths"]["/inventory"]["get"].get("parameters").is_none());
        assert_eq!(
            doc["paths"]["/categories/{id}"]["delete"]["description"],
            "Allowed for: creator-or-admin"
        );
    }

    #[test]
    fn test_referenced_schemas_are_registered() {
        let doc = document(true);
        let schemas = &doc["components"]["schemas"];

        for name in [
            "User",
            "Category",
            "CreatedBy",
            "Creator",
            "InventoryItem",
            "StockStatus",
            "Role",
            "ErrorResponse",
            "FieldError",
            "SessionToken",
        ] {
            assert!(schemas.get(name).is_some(), "missing schema {}", name);
        }
    }
}
