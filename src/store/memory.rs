//! In-memory [`ContentStore`] for tests and demos.
//!
//! Collections live behind `std::sync::RwLock`; ids are assigned from a
//! per-collection counter so insertion order equals id order, matching the
//! SQLite backend.

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::model::{Category, ContentItem, NewContentItem, SiteSetting};

use super::{ContentStore, ItemFilter, ItemQuery, SortKey};

#[derive(Default)]
struct Collections {
    categories: Vec<Category>,
    items: Vec<ContentItem>,
    settings: Vec<SiteSetting>,
    subscribers: Vec<String>,
}

pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
        }
    }

    pub fn insert_category(&self, name: &str) -> Result<i64> {
        let mut inner = self.write()?;
        if inner.categories.iter().any(|c| c.name == name) {
            bail!("category {} already exists", name);
        }
        let id = inner.categories.last().map_or(1, |c| c.id + 1);
        inner.categories.push(Category {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn remove_category(&self, id: i64) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.categories.len();
        inner.categories.retain(|c| c.id != id);
        Ok(inner.categories.len() != before)
    }

    pub fn insert_item(&self, item: NewContentItem) -> Result<i64> {
        let mut inner = self.write()?;
        let id = inner.items.last().map_or(1, |i| i.id + 1);
        inner.items.push(ContentItem {
            id,
            title: item.title,
            slug: item.slug,
            category_id: item.category_id,
            tags: item.tags,
            views: item.views,
            is_editors_choice: item.is_editors_choice,
            created_at: item.created_at,
        });
        Ok(id)
    }

    pub fn upsert_setting(&self, key: &str, value: &str) -> Result<i64> {
        let mut inner = self.write()?;
        if let Some(existing) = inner.settings.iter_mut().find(|s| s.key == key) {
            existing.value = value.to_string();
            return Ok(existing.id);
        }
        let id = inner.settings.last().map_or(1, |s| s.id + 1);
        inner.settings.push(SiteSetting {
            id,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(id)
    }

    pub fn insert_subscriber(&self, email: &str) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.subscribers.iter().any(|s| s == email) {
            inner.subscribers.push(email.to_string());
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_items(items: &mut [ContentItem], key: SortKey) {
    match key {
        SortKey::ViewsDesc => items.sort_by(|a, b| b.views.cmp(&a.views).then(b.id.cmp(&a.id))),
        SortKey::CreatedDesc => {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.read()?.categories.clone())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .read()?
            .categories
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn resolve_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.read()?.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_items(&self, query: &ItemQuery) -> Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .read()?
            .items
            .iter()
            .filter(|i| query.filter.matches(i))
            .cloned()
            .collect();
        if let Some(key) = query.sort {
            sort_items(&mut items, key);
        }
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(items.into_iter().skip(skip).take(limit).collect())
    }

    async fn count_items(&self, filter: &ItemFilter) -> Result<u64> {
        let count = self.read()?.items.iter().filter(|i| filter.matches(i)).count();
        Ok(count as u64)
    }

    async fn distinct_tags(&self) -> Result<Vec<String>> {
        let tags: BTreeSet<String> = self
            .read()?
            .items
            .iter()
            .flat_map(|i| i.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn list_settings(&self) -> Result<Vec<SiteSetting>> {
        Ok(self.read()?.settings.clone())
    }

    async fn count_categories(&self) -> Result<u64> {
        Ok(self.read()?.categories.len() as u64)
    }

    async fn count_subscribers(&self) -> Result<u64> {
        Ok(self.read()?.subscribers.len() as u64)
    }
}
