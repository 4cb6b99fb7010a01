/// Status and health check endpoints
///
/// # Endpoints
///
/// ```text
/// GET /        # process is up
/// GET /health  # process is up, store reachable?
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "status": "healthy",
///   "message": "PIEM API Server is running",
///   "timestamp": "2025-01-01T00:00:00Z",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

const RUNNING: &str = "PIEM API Server is running";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,

    /// `healthy` or `degraded`
    pub status: String,

    pub message: String,

    pub timestamp: DateTime<Utc>,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

/// Status handler
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": RUNNING,
        "environment": state.config.api.environment,
        "docs": "/api-docs/openapi.json",
    }))
}

/// Health check handler
///
/// Always 200; an unreachable store only degrades the status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(backend = state.store.backend(), error = %e, "Store ping failed");
            false
        }
    };

    Json(HealthResponse {
        success: true,
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        message: RUNNING.to_string(),
        timestamp: Utc::now(),
        version: piem_shared::VERSION.to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}
