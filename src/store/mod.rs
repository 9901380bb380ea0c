//! Read-side contract of the document store.
//!
//! The aggregation engine only talks to persistence through [`ContentStore`].
//! Two backends ship with the crate: [`SqliteStore`] for production and
//! [`InMemoryStore`] for tests and demos. Both must honour the ordering rules
//! documented on [`SortKey`] and [`ContentStore::find_items`], otherwise
//! paginated slices drift from their counts.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Category, ContentItem, SiteSetting};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Predicate applied to the content collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemFilter {
    #[default]
    All,
    Category(i64),
    EditorsChoice,
}

impl ItemFilter {
    pub fn matches(&self, item: &ContentItem) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Category(id) => item.category_id == Some(*id),
            ItemFilter::EditorsChoice => item.is_editors_choice,
        }
    }
}

/// Sort keys understood by the store. Ties are broken by id descending
/// (reverse insertion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ViewsDesc,
    CreatedDesc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub filter: ItemFilter,
    pub sort: Option<SortKey>,
    pub limit: Option<u64>,
    pub skip: u64,
}

impl ItemQuery {
    pub fn new(filter: ItemFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All categories in insertion order.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Follow a content item's category reference. `None` when dangling.
    async fn resolve_category(&self, id: i64) -> Result<Option<Category>>;

    /// Items matching `query.filter`, ordered by `query.sort` or, when no sort
    /// key is given, by insertion order (id ascending). `skip` is applied
    /// before `limit`.
    async fn find_items(&self, query: &ItemQuery) -> Result<Vec<ContentItem>>;

    async fn count_items(&self, filter: &ItemFilter) -> Result<u64>;

    /// Every tag used by any item, deduplicated and sorted ascending.
    async fn distinct_tags(&self) -> Result<Vec<String>>;

    async fn list_settings(&self) -> Result<Vec<SiteSetting>>;

    async fn count_categories(&self) -> Result<u64>;

    async fn count_subscribers(&self) -> Result<u64>;
}
