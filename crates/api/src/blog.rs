//! Blog entries: the owned resource behind the `/blog-entries` routes.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use quill_auth::{ResourceStore, StoreError};
use quill_core::{EntryId, ResourceId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogEntry {
    pub id: EntryId,
    pub title: String,
    pub body: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct EntryTable {
    last_id: i64,
    rows: BTreeMap<EntryId, BlogEntry>,
}

/// In-memory blog entry store. Doubles as the ownership lookup for entries.
#[derive(Debug, Default)]
pub struct BlogEntryStore {
    inner: RwLock<EntryTable>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("blog entry table lock poisoned".to_string())
}

impl BlogEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        author: UserId,
        title: String,
        body: String,
        now: DateTime<Utc>,
    ) -> Result<BlogEntry, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        table.last_id += 1;
        let entry = BlogEntry {
            id: EntryId::new(table.last_id),
            title,
            body,
            author,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(entry.id, entry.clone());
        Ok(entry)
    }

    pub fn get(&self, id: EntryId) -> Result<Option<BlogEntry>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    /// Apply the given fields; `None` leaves a field as is. The author never changes.
    pub fn update(
        &self,
        id: EntryId,
        title: Option<String>,
        body: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<BlogEntry>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let Some(entry) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            entry.title = title;
        }
        if let Some(body) = body {
            entry.body = body;
        }
        entry.updated_at = now;
        Ok(Some(entry.clone()))
    }

    pub fn delete(&self, id: EntryId) -> Result<bool, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl ResourceStore for BlogEntryStore {
    async fn find_owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError> {
        Ok(self.get(EntryId::from(resource))?.map(|e| e.author))
    }
}
