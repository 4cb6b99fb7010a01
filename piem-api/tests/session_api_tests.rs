/// Integration tests for sessions, route gates and server-level behavior
///
/// - Session resolution (missing, malformed, expired, orphaned tokens)
/// - Per-method gates on users, categories, inventory and suppliers
/// - Session endpoints
/// - Health, status, fallback, API docs, security headers

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{inventory_item, supplier, TestContext, SESSION_SECRET};
use piem_shared::auth::session::{create_session_token, SessionClaims};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_user_routes_gates() {
    let ctx = TestContext::new().await.unwrap();

    assert_eq!(ctx.get("/users", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        ctx.get("/users", Some(&ctx.user_token)).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        ctx.post("/users", Some(&ctx.user_token), json!({ "username": "eve", "email": "eve@example.com" }))
            .await
            .status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        ctx.delete(&format!("/users/{}", ctx.admin.id), Some(&ctx.user_token))
            .await
            .status,
        StatusCode::FORBIDDEN
    );

    let own = ctx
        .get(&format!("/users/{}", ctx.user.id), None)
        .await;
    assert_eq!(own.status, StatusCode::UNAUTHORIZED);
    assert_eq!(own.body["message"], "Authentication required");

    let own = ctx
        .get(&format!("/users/{}", ctx.user.id), Some(&ctx.user_token))
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["data"]["email"], "jane@example.com");
}

#[tokio::test]
async fn test_category_reads_open_writes_gated() {
    let ctx = TestContext::new().await.unwrap();

    assert_eq!(ctx.get("/categories", None).await.status, StatusCode::OK);

    let response = ctx.post("/categories", None, json!({ "name": "Sports" })).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);

    let id = Uuid::new_v4();
    assert_eq!(
        ctx.put(&format!("/categories/{}", id), None, json!({ "name": "x" })).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        ctx.delete(&format!("/categories/{}", id), None).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_inventory_and_supplier_writes_gated_by_default() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.post("/inventory", None, inventory_item("Lamp")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx.post("/supplier", None, supplier("Globex")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx
        .post("/inventory", Some(&ctx.user_token), inventory_item("Lamp"))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_inventory_writes_open_when_gate_disabled() {
    let ctx = TestContext::with_env(&[("AUTH_GATE_WRITES", "false")])
        .await
        .unwrap();

    let response = ctx.post("/inventory", None, inventory_item("Lamp")).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let uri = format!("/inventory/{}", response.body["data"]["_id"].as_str().unwrap());
    assert_eq!(
        ctx.put(&uri, None, json!({ "quantity": 1 })).await.status,
        StatusCode::OK
    );
    assert_eq!(ctx.delete(&uri, None).await.status, StatusCode::OK);

    // Categories stay gated regardless
    assert_eq!(
        ctx.post("/categories", None, json!({ "name": "Sports" })).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/categories", Some("not-a-jwt")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid session token");

    let mut claims = SessionClaims::new(ctx.user.id, Duration::hours(1));
    claims.exp = claims.iat - 60;
    let expired = create_session_token(&claims, SESSION_SECRET).unwrap();
    let response = ctx.get("/auth/session", Some(&expired)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Session expired");

    let forged = create_session_token(
        &SessionClaims::new(ctx.admin.id, Duration::hours(1)),
        "some-other-secret-that-is-long-enough!!",
    )
    .unwrap();
    assert_eq!(
        ctx.get("/auth/session", Some(&forged)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .delete(&format!("/users/{}", ctx.user.id), Some(&ctx.admin_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = ctx.get("/auth/session", Some(&ctx.user_token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Session user no longer exists");
}

#[tokio::test]
async fn test_role_change_applies_to_existing_sessions() {
    let ctx = TestContext::new().await.unwrap();

    assert_eq!(
        ctx.get("/users", Some(&ctx.user_token)).await.status,
        StatusCode::FORBIDDEN
    );

    ctx.put(
        &format!("/users/{}", ctx.user.id),
        Some(&ctx.admin_token),
        json!({ "role": "admin" }),
    )
    .await;

    assert_eq!(
        ctx.get("/users", Some(&ctx.user_token)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_session_endpoints() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/auth/session", Some(&ctx.user_token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "jane");

    assert_eq!(
        ctx.get("/auth/session", None).await.status,
        StatusCode::UNAUTHORIZED
    );

    let response = ctx
        .post("/auth/sessions", Some(&ctx.admin_token), json!({ "userId": ctx.user.id }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let token = response.body["data"]["token"].as_str().unwrap().to_string();
    assert!(response.body["data"]["expiresAt"].is_string());

    let me = ctx.get("/auth/session", Some(&token)).await;
    assert_eq!(me.body["data"]["_id"], ctx.user.id.to_string());

    let response = ctx
        .post("/auth/sessions", Some(&ctx.user_token), json!({ "userId": ctx.user.id }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .post("/auth/sessions", Some(&ctx.admin_token), json!({ "userId": Uuid::new_v4() }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx
        .post("/auth/sessions", Some(&ctx.admin_token), json!({ "userId": "nope" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid ID format");
}

#[tokio::test]
async fn test_health_and_status() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");
    assert_eq!(response.body["version"], piem_shared::VERSION);
    assert!(response.body["timestamp"].is_string());

    let response = ctx.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "PIEM API Server is running");
}

#[tokio::test]
async fn test_health_degrades_when_store_closed() {
    let ctx = TestContext::new().await.unwrap();
    ctx.store.close().await;

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "degraded");
    assert_eq!(response.body["database"], "disconnected");
}

#[tokio::test]
async fn test_store_fault_is_internal_error() {
    let ctx = TestContext::new().await.unwrap();
    ctx.store.close().await;

    let response = ctx.get("/categories", None).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["message"], "Internal server error");
    assert!(response.body["error"].is_string());

    let prod = TestContext::with_env(&[("APP_ENV", "production")]).await.unwrap();
    prod.store.close().await;
    let response = prod.get("/categories", None).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/widgets/42", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["message"], "Route not found: GET /widgets/42");
    assert!(response.body["suggestion"].is_string());

    // One mount level only
    assert_eq!(
        ctx.get("/inventory/inventory", None).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ctx.get("/suppliers", None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_openapi_document_served() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["openapi"], "3.0.3");
    assert!(response.body["paths"]["/categories/{id}"]["put"].is_object());
}

#[tokio::test]
async fn test_security_headers() {
    let ctx = TestContext::new().await.unwrap();

    for uri in ["/health", "/no-such-route"] {
        let response = ctx.get(uri, None).await;
        assert_eq!(response.headers["x-content-type-options"], "nosniff");
        assert_eq!(response.headers["x-frame-options"], "DENY");
        assert!(response.headers.get("strict-transport-security").is_none());
    }

    let prod = TestContext::with_env(&[("APP_ENV", "production")]).await.unwrap();
    let response = prod.get("/health", None).await;
    assert!(response.headers.get("strict-transport-security").is_some());
}
