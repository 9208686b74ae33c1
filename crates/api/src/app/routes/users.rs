use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use quill_auth::{AuthError, LoginRequest, NewAccount, Principal, UserProfile, bounded};
use quill_core::{ResourceId, UserId};

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{Operation, authorize_operation};

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewAccount>,
) -> axum::response::Response {
    match services.credentials.signup(body).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(e) => errors::auth_error_to_response(&e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match services.credentials.login(body, Utc::now()).await {
        Ok(access_token) => {
            (StatusCode::OK, Json(dto::LoginResponse { access_token })).into_response()
        }
        Err(e) => errors::auth_error_to_response(&e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match bounded(services.lookup_timeout, services.users.find_by_id(id)).await {
        Ok(Some(record)) => (StatusCode::OK, Json(UserProfile::from(record))).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let target = id.parse::<UserId>().ok();
    if let Err(resp) =
        authorize_operation(&services, Operation::UpdateUser, &principal, target.map(ResourceId::from))
            .await
    {
        return resp;
    }
    let Some(id) = target else {
        return errors::not_found();
    };

    match bounded(
        services.lookup_timeout,
        services.users.update_profile(id, body.into()),
    )
    .await
    {
        Ok(Some(record)) => (StatusCode::OK, Json(UserProfile::from(record))).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let target = id.parse::<UserId>().ok();
    if let Err(resp) =
        authorize_operation(&services, Operation::DeleteUser, &principal, target.map(ResourceId::from))
            .await
    {
        return resp;
    }
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match bounded(services.lookup_timeout, services.users.delete(id)).await {
        Ok(true) => {
            tracing::info!(user_id = id.get(), by = principal.id().get(), "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::RoleChangeRequest>,
) -> axum::response::Response {
    let target = id.parse::<UserId>().ok();
    if let Err(resp) = authorize_operation(
        &services,
        Operation::ChangeUserRole,
        &principal,
        target.map(ResourceId::from),
    )
    .await
    {
        return resp;
    }
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match bounded(services.lookup_timeout, services.users.update_role(id, body.role)).await {
        Ok(Some(record)) => {
            tracing::info!(
                user_id = id.get(),
                role = %record.role,
                by = principal.id().get(),
                "user role changed"
            );
            (StatusCode::OK, Json(UserProfile::from(record))).into_response()
        }
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse::<UserId>()
        .map_err(|e| errors::auth_error_to_response(&AuthError::from(e)))
}
