use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

use quill_auth::{Authorizer, GuardContext};

use crate::app::errors;
use crate::context::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AuthState {
    pub authorizer: Arc<Authorizer>,
    pub lookup_timeout: Duration,
}

/// Verify the bearer token and attach the resolved [`quill_auth::Principal`].
///
/// Handlers behind this layer can rely on `Extension<Principal>` being
/// present; anything that fails here is a uniform 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = extract_bearer(req.headers());
    let ctx = GuardContext::new(state.lookup_timeout);

    let principal = match state.authorizer.authenticate(token, &ctx, Utc::now()).await {
        Ok(p) => p,
        Err(_e) => {
            return errors::json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "authentication required",
            );
        }
    };

    tracing::Span::current().record("user_id", principal.id().get());
    req.extensions_mut().insert(principal);

    next.run(req).await
}

/// Open the request span and tag the response with its id.
pub async fn request_context(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let ctx = RequestContext::new();
    req.extensions_mut().insert(ctx);

    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        method = %req.method(),
        path = %req.uri().path(),
        user_id = tracing::field::Empty,
    );

    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| tracing::debug!(status = response.status().as_u16(), "request finished"));

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// `None` covers every way the header can be unusable; the authorizer treats
/// a missing token as malformed.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
