use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use quill_core::UserId;

use crate::error::AuthError;
use crate::roles::Role;
use crate::store::{UserStore, bounded};

/// The authenticated identity for one request.
///
/// Only [`PrincipalResolver`] constructs it, and only from a verified token
/// subject plus a fresh store lookup; nothing request-supplied feeds into it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: UserId,
    role: Role,
}

impl Principal {
    pub(crate) fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Turns a verified token subject into a [`Principal`].
///
/// A valid token is necessary but not sufficient: the user must still exist.
/// The role is read from the store, so role changes apply on the next request.
#[derive(Clone)]
pub struct PrincipalResolver {
    users: Arc<dyn UserStore>,
}

impl PrincipalResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// # Errors
    ///
    /// - `PrincipalNotFound` if the subject was deleted after issuance
    /// - `StoreUnavailable` if the lookup failed or exceeded `budget`
    pub async fn resolve(&self, subject: UserId, budget: Duration) -> Result<Principal, AuthError> {
        let user = bounded(budget, self.users.find_by_id(subject))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?
            .ok_or(AuthError::PrincipalNotFound)?;

        Ok(Principal::new(user.id, user.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::InMemoryUserStore;
    use crate::password::PasswordHash;
    use crate::store::{NewUser, ProfileUpdate, UserRecord};

    const BUDGET: Duration = Duration::from_millis(200);

    async fn store_with_user(role: Role) -> (Arc<InMemoryUserStore>, UserId) {
        let store = Arc::new(InMemoryUserStore::new());
        let user = store
            .insert(NewUser {
                name: "Alice".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                role,
                password_hash: PasswordHash::from_phc("$argon2id$placeholder"),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    #[tokio::test]
    async fn resolves_current_role() {
        let (store, id) = store_with_user(Role::User).await;
        let resolver = PrincipalResolver::new(store.clone());

        let principal = resolver.resolve(id, BUDGET).await.unwrap();
        assert_eq!(principal, Principal::new(id, Role::User));

        store.update_role(id, Role::Admin).await.unwrap();
        let principal = resolver.resolve(id, BUDGET).await.unwrap();
        assert_eq!(principal.role(), Role::Admin);
    }

    #[tokio::test]
    async fn deleted_user_is_not_found() {
        let (store, id) = store_with_user(Role::User).await;
        let resolver = PrincipalResolver::new(store.clone());
        store.delete(id).await.unwrap();

        assert_eq!(
            resolver.resolve(id, BUDGET).await,
            Err(AuthError::PrincipalNotFound)
        );
    }

    struct DownStore;

    #[async_trait::async_trait]
    impl UserStore for DownStore {
        async fn find_by_id(&self, _id: UserId) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn insert(&self, _user: NewUser) -> Result<UserRecord, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn update_profile(
            &self,
            _id: UserId,
            _update: ProfileUpdate,
        ) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn update_role(&self, _id: UserId, _role: Role) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn delete(&self, _id: UserId) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let resolver = PrincipalResolver::new(Arc::new(DownStore));
        let err = resolver.resolve(UserId::new(1), BUDGET).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        assert!(err.is_unauthenticated());
    }
}
