//! `quill-auth` — authentication/authorization pipeline (fail-closed).
//!
//! This crate is intentionally decoupled from HTTP. Stores are consumed through
//! the [`UserStore`] / [`ResourceStore`] traits.
//!
//! Request flow: [`TokenService`] verifies the bearer token, the
//! [`PrincipalResolver`] turns its subject into a [`Principal`], then the
//! operation's [`GuardChain`] runs. [`Authorizer`] ties the three together.

pub mod authorize;
pub mod chain;
pub mod claims;
pub mod config;
pub mod error;
pub mod guard;
pub mod login;
pub mod memory;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod store;
pub mod token;

pub use authorize::{AuthStage, Authorizer, check_guards};
pub use chain::GuardChain;
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use config::{AuthConfig, ConfigError, HashCost};
pub use error::{AuthError, Rejection, StoreError};
pub use guard::{
    DenyReason, Guard, GuardContext, GuardDecision, OwnerResolver, OwnershipGuard, RoleGuard,
    SelfOwnership, StoreOwnership,
};
pub use login::{CredentialService, LoginRequest, NewAccount};
pub use memory::{InMemoryResourceStore, InMemoryUserStore};
pub use password::{PasswordHash, PasswordHasher};
pub use policy::GuardTable;
pub use principal::{Principal, PrincipalResolver};
pub use roles::Role;
pub use store::{
    NewUser, ProfileUpdate, ResourceStore, UserProfile, UserRecord, UserStore, bounded,
};
pub use token::TokenService;
