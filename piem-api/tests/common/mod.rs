/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory store, so no external services are needed
/// - A seeded admin and a seeded regular user, each with a session token
/// - Request helpers that drive the router in-process

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use piem_api::app::{build_router, AppState};
use piem_api::config::Config;
use piem_shared::auth::session::issue_session_token;
use piem_shared::models::user::User;
use piem_shared::resource::ResourceService;
use piem_shared::store::{memory::MemoryDocumentStore, SharedStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::Service as _;

pub const SESSION_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: SharedStore,
    pub app: axum::Router,
    pub config: Config,
    pub admin: User,
    pub admin_token: String,
    pub user: User,
    pub user_token: String,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestContext {
    /// Creates a context with default configuration
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_env(&[]).await
    }

    /// Creates a context with extra environment variables
    pub async fn with_env(vars: &[(&str, &str)]) -> anyhow::Result<Self> {
        let mut env: HashMap<String, String> = HashMap::from([
            ("SESSION_SECRET".to_string(), SESSION_SECRET.to_string()),
            ("STORE_BACKEND".to_string(), "memory".to_string()),
        ]);
        env.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let config = Config::from_lookup(|key| env.get(key).cloned())?;

        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let users = ResourceService::<User>::new(store.clone());

        let admin = users
            .create(
                json!({ "username": "admin", "email": "admin@example.com", "role": "admin" }),
                None,
            )
            .await?;
        let user = users
            .create(json!({ "username": "jane", "email": "jane@example.com" }), None)
            .await?;

        let ttl = config.session.ttl();
        let (admin_token, _) = issue_session_token(admin.id, SESSION_SECRET, ttl)?;
        let (user_token, _) = issue_session_token(user.id, SESSION_SECRET, ttl)?;

        let app = build_router(AppState::new(store.clone(), config.clone()));

        Ok(TestContext {
            store,
            app,
            config,
            admin,
            admin_token,
            user,
            user_token,
        })
    }

    /// Sends a request and decodes the JSON body (`Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Sends a prepared request
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "Expected JSON body, got {}: {}",
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Creates a category as the given caller, returning its record
    pub async fn create_category(&self, token: &str, body: Value) -> Value {
        let response = self.post("/categories", Some(token), body).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "category create failed: {}",
            response.body
        );
        response.body["data"].clone()
    }
}

/// Valid inventory payload
pub fn inventory_item(name: &str) -> Value {
    json!({
        "name": name,
        "category": "Electronics",
        "quantity": 5,
        "price": 199.99,
        "status": "Available",
        "supplier": "Acme Supply",
    })
}

/// Valid supplier payload
pub fn supplier(name: &str) -> Value {
    json!({
        "name": name,
        "contactName": "Maria Lopez",
        "email": "Orders@Acme.example",
        "phone": "+1 (555) 010-2000",
        "address": "12 Harbor Road",
        "city": "Portland",
        "state": "Oregon",
        "zipCode": "97201",
    })
}
