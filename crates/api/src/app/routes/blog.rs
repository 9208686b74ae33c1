use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use quill_auth::{AuthError, Principal};
use quill_core::{DomainError, EntryId, ResourceId};

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{Operation, authorize_operation};

pub async fn create_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreateBlogEntryRequest>,
) -> axum::response::Response {
    if let Err(resp) =
        authorize_operation(&services, Operation::CreateBlogEntry, &principal, None).await
    {
        return resp;
    }

    let title = body.title.trim();
    if title.is_empty() {
        let err = AuthError::from(DomainError::validation("title is required"));
        return errors::auth_error_to_response(&err);
    }

    // The author is always the caller; the body cannot name one.
    match services
        .entries
        .create(principal.id(), title.to_string(), body.body, Utc::now())
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<EntryId>() {
        Ok(id) => id,
        Err(e) => return errors::auth_error_to_response(&AuthError::from(e)),
    };

    match services.entries.get(id) {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateBlogEntryRequest>,
) -> axum::response::Response {
    let target = id.parse::<EntryId>().ok();
    if let Err(resp) = authorize_operation(
        &services,
        Operation::UpdateBlogEntry,
        &principal,
        target.map(ResourceId::from),
    )
    .await
    {
        return resp;
    }
    let Some(id) = target else {
        return errors::not_found();
    };

    match services.entries.update(id, body.title, body.body, Utc::now()) {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let target = id.parse::<EntryId>().ok();
    if let Err(resp) = authorize_operation(
        &services,
        Operation::DeleteBlogEntry,
        &principal,
        target.map(ResourceId::from),
    )
    .await
    {
        return resp;
    }
    let Some(id) = target else {
        return errors::not_found();
    };

    match services.entries.delete(id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
