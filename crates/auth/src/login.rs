//! Signup and login flows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::OnceCell;

use quill_core::{DomainError, normalize_email};

use crate::error::AuthError;
use crate::password::{PasswordHash, PasswordHasher};
use crate::roles::Role;
use crate::store::{NewUser, UserProfile, UserStore, bounded};
use crate::token::TokenService;

/// Signup payload. The client supplies a fresh plaintext password only;
/// role and hash are never accepted from outside.
#[derive(Clone, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credential checks and token issuance.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
    lookup_timeout: Duration,
    /// Verified against when the email is unknown, so that path costs one
    /// full hash verification like a wrong password does.
    decoy: Arc<OnceCell<PasswordHash>>,
}

const DECOY_PASSWORD: &str = "quill-decoy-password";

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            lookup_timeout,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    /// Create a `Role::User` account and return its public profile.
    pub async fn signup(&self, account: NewAccount) -> Result<UserProfile, AuthError> {
        let email = normalize_email(&account.email)?;
        let name = required_field("name", &account.name)?;
        let username = required_field("username", &account.username)?;
        if account.password.is_empty() {
            return Err(DomainError::validation("password must not be empty").into());
        }

        let password_hash = self.hash(account.password).await?;
        let record = bounded(
            self.lookup_timeout,
            self.users.insert(NewUser {
                name,
                username,
                email,
                role: Role::User,
                password_hash,
            }),
        )
        .await?;

        tracing::info!(user_id = %record.id, "account created");
        Ok(UserProfile::from(record))
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown email and wrong password are the same error.
    pub async fn login(&self, request: LoginRequest, now: DateTime<Utc>) -> Result<String, AuthError> {
        let Ok(email) = normalize_email(&request.email) else {
            return Err(AuthError::InvalidCredentials);
        };

        let user = bounded(self.lookup_timeout, self.users.find_by_email(&email))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let Some(user) = user else {
            tracing::debug!("login for unknown email");
            let decoy = self.decoy_hash().await?;
            self.verify(request.password, decoy).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(request.password, user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, now)?;
        tracing::info!(user_id = %user.id, "session token issued");
        Ok(token)
    }

    /// Hashed once with the configured cost, on first use.
    async fn decoy_hash(&self) -> Result<PasswordHash, AuthError> {
        self.decoy
            .get_or_try_init(|| self.hash(DECOY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    async fn hash(&self, plaintext: String) -> Result<PasswordHash, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify(&self, plaintext: String, hash: PasswordHash) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

fn required_field(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}
