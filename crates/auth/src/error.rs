//! Error taxonomy for the auth pipeline.
//!
//! Internally every failure keeps its precise cause (for logs). Externally the
//! causes collapse into a [`Rejection`], so callers cannot tell an expired token
//! from a forged one, or a missing resource from someone else's resource.

use std::time::Duration;

use thiserror::Error;

use quill_core::DomainError;

use crate::guard::DenyReason;

/// Failure reported by a store collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token (or stored credential) is structurally invalid.
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    /// Token was valid but its subject no longer exists.
    #[error("principal not found")]
    PrincipalNotFound,

    /// Login failed (unknown email or wrong password).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but a guard denied the operation.
    #[error("forbidden by guard '{guard}' ({reason:?})")]
    Forbidden {
        guard: &'static str,
        reason: DenyReason,
    },

    /// A store lookup needed to authenticate failed or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store write outside authentication (e.g. signup) failed or timed out.
    #[error("store failure: {0}")]
    Store(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => AuthError::Domain(DomainError::Conflict(msg)),
            other => AuthError::Store(other.to_string()),
        }
    }
}

/// Externally visible outcome of a failed request.
///
/// This is the only thing transports are allowed to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unauthenticated,
    Forbidden,
    Invalid(String),
    NotFound,
    Conflict,
    Unavailable,
    Internal,
}

impl AuthError {
    /// Collapse the internal cause into what the caller may see.
    pub fn rejection(&self) -> Rejection {
        match self {
            AuthError::Malformed
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::PrincipalNotFound
            | AuthError::InvalidCredentials
            | AuthError::StoreUnavailable(_) => Rejection::Unauthenticated,
            AuthError::Forbidden { .. } => Rejection::Forbidden,
            AuthError::Store(_) => Rejection::Unavailable,
            AuthError::Hashing(_) | AuthError::Signing(_) => Rejection::Internal,
            AuthError::Domain(DomainError::Validation(msg)) => Rejection::Invalid(msg.clone()),
            AuthError::Domain(DomainError::InvalidId(msg)) => Rejection::Invalid(msg.clone()),
            AuthError::Domain(DomainError::NotFound) => Rejection::NotFound,
            AuthError::Domain(DomainError::Conflict(_)) => Rejection::Conflict,
        }
    }

    /// True for every cause that means "we don't know who you are".
    pub fn is_unauthenticated(&self) -> bool {
        self.rejection() == Rejection::Unauthenticated
    }
}
