/// Session endpoints
///
/// Sign-in itself happens at an external identity provider; this API only
/// issues and consumes session tokens.
///
/// # Endpoints
///
/// - `GET /auth/session` - The caller's own user record
/// - `POST /auth/sessions` - Issue a session token for a user (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use piem_shared::{
    auth::{caller::Caller, session::issue_session_token},
    models::user::User,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use utoipa::ToSchema;

/// Issue session request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueSessionRequest {
    pub user_id: String,
}

/// Issued session token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// Bearer token for the `Authorization` header
    pub token: String,

    pub expires_at: DateTime<Utc>,
}

/// Returns the user behind the current session
///
/// ```text
/// GET /auth/session
/// Authorization: Bearer eyJ...
/// ```
pub async fn current_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Value>> {
    let user = state
        .service::<User>()
        .get(&caller.id.to_string(), Some(&caller))
        .await?;

    Ok(Json(json!({ "success": true, "data": user })))
}

/// Issues a session token for an existing user
///
/// ```text
/// POST /auth/sessions
/// Authorization: Bearer eyJ...  (admin)
/// Content-Type: application/json
///
/// { "userId": "4f0c..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: body malformed or `userId` not a valid id
/// - `404 Not Found`: no such user
pub async fn issue_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<IssueSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = body?;

    let user = state
        .service::<User>()
        .get(&request.user_id, Some(&caller))
        .await?;

    let (token, expires_at) =
        issue_session_token(user.id, state.session_secret(), state.config.session.ttl())
            .map_err(ApiError::from)?;

    info!(user_id = %user.id, issued_by = %caller.id, "Session token issued");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": SessionToken { token, expires_at },
        })),
    ))
}
