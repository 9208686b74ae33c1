use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use quill_auth::Principal;

use crate::app::services::AppServices;
use crate::authz::{Operation, authorize_operation};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    if let Err(resp) = authorize_operation(&services, Operation::WhoAmI, &principal, None).await {
        return resp;
    }

    Json(serde_json::json!({
        "id": principal.id(),
        "role": principal.role(),
    }))
    .into_response()
}
