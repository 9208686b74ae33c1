//! In-memory store implementations for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use quill_core::{ResourceId, UserId};

use crate::error::StoreError;
use crate::roles::Role;
use crate::store::{NewUser, ProfileUpdate, ResourceStore, UserRecord, UserStore};

#[derive(Debug, Default)]
struct UserTable {
    last_id: i64,
    rows: BTreeMap<UserId, UserRecord>,
}

/// In-memory User Store with sequential ids.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with a caller-chosen id (fixtures). Replaces any
    /// existing record with that id.
    pub fn seed(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        table.last_id = table.last_id.max(record.id.get());
        table.rows.insert(record.id, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("user table lock poisoned".to_string())
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }

        table.last_id += 1;
        let record = UserRecord {
            id: UserId::new(table.last_id),
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
            profile_image: None,
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let Some(record) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(username) = update.username {
            record.username = username;
        }
        if let Some(image) = update.profile_image {
            record.profile_image = Some(image);
        }
        Ok(Some(record.clone()))
    }

    async fn update_role(&self, id: UserId, role: Role) -> Result<Option<UserRecord>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&id).map(|record| {
            record.role = role;
            record.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.remove(&id).is_some())
    }
}

/// In-memory `(resource → owner)` map.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    owners: RwLock<HashMap<ResourceId, UserId>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_owner(&self, resource: impl Into<ResourceId>, owner: UserId) -> Result<(), StoreError> {
        let mut owners = self.owners.write().map_err(|_| owners_poisoned())?;
        owners.insert(resource.into(), owner);
        Ok(())
    }

    pub fn remove(&self, resource: impl Into<ResourceId>) -> Result<(), StoreError> {
        let mut owners = self.owners.write().map_err(|_| owners_poisoned())?;
        owners.remove(&resource.into());
        Ok(())
    }
}

fn owners_poisoned() -> StoreError {
    StoreError::Unavailable("ownership table lock poisoned".to_string())
}

#[async_trait::async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn find_owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError> {
        let owners = self.owners.read().map_err(|_| owners_poisoned())?;
        Ok(owners.get(&resource).copied())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::password::PasswordHash;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            username: "test".to_string(),
            email: email.to_string(),
            role: Role::User,
            password_hash: PasswordHash::from_phc("$argon2id$placeholder"),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        let a = store.insert(new_user("a@example.com")).await.unwrap();
        let b = store.insert(new_user("b@example.com")).await.unwrap();
        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));

        let dup = store.insert(new_user("a@example.com")).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn profile_update_leaves_credentials_alone() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("a@example.com")).await.unwrap();

        let updated = store
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.password_hash, user.password_hash);
        assert_eq!(updated.role, Role::User);
    }

    #[tokio::test]
    async fn seeded_ids_do_not_collide_with_inserted_ones() {
        let store = InMemoryUserStore::new();
        let mut fixture = store.insert(new_user("x@example.com")).await.unwrap();
        fixture.id = UserId::new(42);
        fixture.email = "seed@example.com".to_string();
        store.seed(fixture).unwrap();

        let next = store.insert(new_user("y@example.com")).await.unwrap();
        assert_eq!(next.id, UserId::new(43));
    }

    #[tokio::test]
    async fn delete_and_role_change() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("a@example.com")).await.unwrap();

        let promoted = store.update_role(user.id, Role::Admin).await.unwrap().unwrap();
        assert_eq!(promoted.role, Role::Admin);

        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
        assert!(store.update_role(user.id, Role::User).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resource_owner_lookup() {
        let store = InMemoryResourceStore::new();
        store.set_owner(ResourceId::new(10), UserId::new(1)).unwrap();

        assert_eq!(
            store.find_owner_of(ResourceId::new(10)).await.unwrap(),
            Some(UserId::new(1))
        );
        assert_eq!(store.find_owner_of(ResourceId::new(11)).await.unwrap(), None);

        store.remove(ResourceId::new(10)).unwrap();
        assert_eq!(store.find_owner_of(ResourceId::new(10)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn poisoned_ownership_table_reports_errors() {
        let store = Arc::new(InMemoryResourceStore::new());
        let writer = store.clone();
        let _ = std::thread::spawn(move || {
            let _held = writer.owners.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(
            store.set_owner(ResourceId::new(1), UserId::new(1)),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.remove(ResourceId::new(1)),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.find_owner_of(ResourceId::new(1)).await.is_err());
    }
}
