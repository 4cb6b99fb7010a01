/// API route handlers
///
/// - `resources`: generic CRUD endpoints for users, categories, inventory and suppliers
/// - `auth`: session endpoints
/// - `health`: status and health check
/// - `docs`: OpenAPI document
///
/// The 404 fallback and the panic handler live here as well.

pub mod auth;
pub mod docs;
pub mod health;
pub mod resources;

use std::any::Any;

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Fallback for unmatched routes
pub async fn not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Route not found: {} {}", method, uri),
            "suggestion": "Check the API documentation at /api-docs/openapi.json for available endpoints",
        })),
    )
        .into_response()
}

/// Converts a handler panic into a generic 500 envelope
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "Internal server error",
        })),
    )
        .into_response()
}
