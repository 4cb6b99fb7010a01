/// Session resolution and route gates
///
/// [`resolve_session`] runs on every request. With an
/// `Authorization: Bearer <token>` header it validates the session token,
/// loads the user it names and inserts a [`Caller`] into the request
/// extensions. Without the header the request continues anonymously.
///
/// [`require_authenticated`] and [`require_admin`] are applied per route
/// (or per method) on top of that.
///
/// | Situation | Result |
/// |---|---|
/// | No `Authorization` header | anonymous |
/// | Not a Bearer header, bad signature, expired | 401 |
/// | Token for a user that no longer exists | 401 |
/// | Gate `require_authenticated`, anonymous | 401 |
/// | Gate `require_admin`, non-admin caller | 403 |

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use piem_shared::auth::caller::Caller;
use piem_shared::auth::guard::{authenticated, has_role};
use piem_shared::auth::session::validate_session_token;
use piem_shared::models::user::{Role, User};
use piem_shared::store::Collection;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Resolves the caller from the session token, if any
pub async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = validate_session_token(token, state.session_secret()).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        ApiError::from(e)
    })?;

    let user: User = state
        .store
        .find_by_id(Collection::Users, claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "Session token for unknown user");
            ApiError::Unauthorized("Session user no longer exists".to_string())
        })?
        .decode()?;

    req.extensions_mut().insert(Caller::from(&user));

    Ok(next.run(req).await)
}

/// Rejects anonymous requests with 401
pub async fn require_authenticated(req: Request, next: Next) -> ApiResult<Response> {
    authenticated(req.extensions().get::<Caller>())?;
    Ok(next.run(req).await)
}

/// Rejects anonymous requests with 401 and non-admins with 403
pub async fn require_admin(req: Request, next: Next) -> ApiResult<Response> {
    if let Err(e) = has_role(req.extensions().get::<Caller>(), Role::Admin) {
        warn!(path = %req.uri().path(), "Admin route refused");
        return Err(e.into());
    }
    Ok(next.run(req).await)
}
