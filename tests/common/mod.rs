#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use content_index::db;
use content_index::model::{Category, ContentItem, NewContentItem, SiteSetting};
use content_index::store::{ContentStore, InMemoryStore, ItemFilter, ItemQuery, SqliteStore};

pub async fn setup_sqlite() -> SqliteStore {
    let pool = db::init_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    SqliteStore::new(pool)
}

/// Wraps an [`InMemoryStore`], records every call, optionally sleeps before
/// answering and fails the named operation.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: Arc<InMemoryStore>,
    calls: Arc<Mutex<Vec<String>>>,
    fail_on: Arc<Mutex<Option<&'static str>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl RecordingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner: Arc::new(inner),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_on(self, op: &'static str) -> Self {
        *self.fail_on.lock().unwrap() = Some(op);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let failing = *self.fail_on.lock().unwrap();
        if failing == Some(op) {
            return Err(anyhow!("injected failure in {}", op));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentStore for RecordingStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.enter("list_categories").await?;
        self.inner.list_categories().await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.enter("find_category_by_name").await?;
        self.inner.find_category_by_name(name).await
    }

    async fn resolve_category(&self, id: i64) -> Result<Option<Category>> {
        self.enter("resolve_category").await?;
        self.inner.resolve_category(id).await
    }

    async fn find_items(&self, query: &ItemQuery) -> Result<Vec<ContentItem>> {
        self.enter("find_items").await?;
        self.inner.find_items(query).await
    }

    async fn count_items(&self, filter: &ItemFilter) -> Result<u64> {
        self.enter("count_items").await?;
        self.inner.count_items(filter).await
    }

    async fn distinct_tags(&self) -> Result<Vec<String>> {
        self.enter("distinct_tags").await?;
        self.inner.distinct_tags().await
    }

    async fn list_settings(&self) -> Result<Vec<SiteSetting>> {
        self.enter("list_settings").await?;
        self.inner.list_settings().await
    }

    async fn count_categories(&self) -> Result<u64> {
        self.enter("count_categories").await?;
        self.inner.count_categories().await
    }

    async fn count_subscribers(&self) -> Result<u64> {
        self.enter("count_subscribers").await?;
        self.inner.count_subscribers().await
    }
}

/// Three categories {A: 2 items, B: 0 items, C: 1 item} plus one
/// uncategorized item.
pub fn census_fixture() -> InMemoryStore {
    let store = InMemoryStore::new();
    let a = store.insert_category("A").unwrap();
    store.insert_category("B").unwrap();
    let c = store.insert_category("C").unwrap();
    store
        .insert_item(NewContentItem::new("a-one").category(a).views(10))
        .unwrap();
    store
        .insert_item(
            NewContentItem::new("a-two")
                .category(a)
                .views(5)
                .editors_choice(true),
        )
        .unwrap();
    store
        .insert_item(NewContentItem::new("c-one").category(c).views(1).tags(["x"]))
        .unwrap();
    store
        .insert_item(NewContentItem::new("loose").views(0).tags(["y", "x"]))
        .unwrap();
    store.upsert_setting("site_title", "Demo").unwrap();
    store.insert_subscriber("reader@example.com").unwrap();
    store
}
