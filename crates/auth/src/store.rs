//! Store collaborator contracts.
//!
//! Persistence is not part of the auth core; it only consumes these traits.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use quill_core::{ResourceId, UserId};

use crate::error::StoreError;
use crate::password::PasswordHash;
use crate::roles::Role;

/// A user as held by the User Store (includes the password hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: PasswordHash,
    pub profile_image: Option<String>,
}

/// Externally visible projection of a [`UserRecord`] (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            username: record.username.clone(),
            email: record.email.clone(),
            role: record.role,
            profile_image: record.profile_image.clone(),
        }
    }
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            username: record.username,
            email: record.email,
            role: record.role,
            profile_image: record.profile_image,
        }
    }
}

/// Values for a user that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: PasswordHash,
}

/// Self-service profile changes. Email, password and role are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub profile_image: Option<String>,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Lookup by (normalized, lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Persist a new user; fails with `StoreError::Conflict` on a duplicate email.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn update_role(&self, id: UserId, role: Role) -> Result<Option<UserRecord>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Read-only ownership lookup for a protected resource type.
#[async_trait::async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find_owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError>;
}

#[async_trait::async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        (**self).insert(user).await
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>, StoreError> {
        (**self).update_profile(id, update).await
    }

    async fn update_role(&self, id: UserId, role: Role) -> Result<Option<UserRecord>, StoreError> {
        (**self).update_role(id, role).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait::async_trait]
impl<S> ResourceStore for Arc<S>
where
    S: ResourceStore + ?Sized,
{
    async fn find_owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError> {
        (**self).find_owner_of(resource).await
    }
}

/// Run a store call under a time budget. Elapsing counts as a store failure.
pub async fn bounded<T, F>(budget: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_elapsed) => Err(StoreError::Timeout(budget)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_projection_drops_the_hash() {
        let record = UserRecord {
            id: UserId::new(1),
            name: "Alice".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::User,
            password_hash: PasswordHash::from_phc("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA"),
            profile_image: None,
        };

        let json = serde_json::to_value(UserProfile::from(&record)).unwrap();
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn bounded_reports_timeouts() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StoreError>(())
        };
        let result = bounded(Duration::from_millis(10), slow).await;
        assert_eq!(result, Err(StoreError::Timeout(Duration::from_millis(10))));
    }
}
