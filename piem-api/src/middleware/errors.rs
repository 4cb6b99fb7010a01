/// Internal error details outside production
///
/// Handlers never put internal fault messages in the response body. In
/// development the message is still useful, so this middleware rebuilds
/// 500 envelopes carrying an [`InternalErrorDetail`] with an extra `error`
/// field. In production it passes responses through untouched.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::error::InternalErrorDetail;

pub async fn expose_error_details(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    if state.config.api.production {
        return response;
    }

    match response.extensions().get::<InternalErrorDetail>().cloned() {
        Some(InternalErrorDetail(detail)) => {
            let status = response.status();
            (
                status,
                Json(json!({
                    "success": false,
                    "message": "Internal server error",
                    "error": detail,
                })),
            )
                .into_response()
        }
        None => response,
    }
}
