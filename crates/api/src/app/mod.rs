//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, credential service, authorizer and guard table
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use quill_auth::{AuthConfig, ConfigError};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over in-memory stores (used by `main.rs`).
pub fn build_app(config: &AuthConfig) -> Result<Router, ConfigError> {
    let services = Arc::new(services::build_services(config)?);
    Ok(router(services))
}

/// Build the router around already wired services.
pub fn router(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        authorizer: services.authorizer.clone(),
        lookup_timeout: services.lookup_timeout,
    };

    // Protected routes: the auth layer runs before any handler.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(Extension(services)),
        )
}
