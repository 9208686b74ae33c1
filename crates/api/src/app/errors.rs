use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use quill_auth::{AuthError, Rejection, StoreError};

/// Map an auth pipeline error onto the externally visible response.
///
/// Only the collapsed [`Rejection`] reaches the client; the internal cause
/// has already been logged by the pipeline.
pub fn auth_error_to_response(err: &AuthError) -> axum::response::Response {
    match err.rejection() {
        Rejection::Unauthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        ),
        Rejection::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        Rejection::Invalid(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        Rejection::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Rejection::Conflict => json_error(StatusCode::CONFLICT, "conflict", "already exists"),
        Rejection::Unavailable => {
            tracing::error!(error = %err, "store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "try again later",
            )
        }
        Rejection::Internal => {
            tracing::error!(error = %err, "internal error");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

/// Store failures inside an already authorized handler.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Unavailable(_) | StoreError::Timeout(_) => {
            tracing::error!(error = %err, "store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "try again later",
            )
        }
    }
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
