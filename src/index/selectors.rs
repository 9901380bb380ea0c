//! Ranked selectors: bounded, ordered subsets of the content collection.

use std::collections::HashSet;

use futures::future::try_join_all;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::instrument;

use crate::model::Category;
use crate::store::{ContentStore, ItemFilter, ItemQuery, SortKey};

use super::display::{resolve_items, ItemView};
use super::IndexError;

async fn select(
    store: &dyn ContentStore,
    query: ItemQuery,
) -> Result<Vec<ItemView>, IndexError> {
    let items = store.find_items(&query).await?;
    resolve_items(store, items).await
}

/// Most viewed items, views descending.
#[instrument(skip(store))]
pub async fn popular(store: &dyn ContentStore, limit: u64) -> Result<Vec<ItemView>, IndexError> {
    select(
        store,
        ItemQuery::new(ItemFilter::All)
            .sort(SortKey::ViewsDesc)
            .limit(limit),
    )
    .await
}

/// Newest items, creation time descending.
#[instrument(skip(store))]
pub async fn recent(store: &dyn ContentStore, limit: u64) -> Result<Vec<ItemView>, IndexError> {
    select(
        store,
        ItemQuery::new(ItemFilter::All)
            .sort(SortKey::CreatedDesc)
            .limit(limit),
    )
    .await
}

#[instrument(skip(store))]
pub async fn editors_choice(
    store: &dyn ContentStore,
    limit: u64,
) -> Result<Vec<ItemView>, IndexError> {
    select(store, ItemQuery::new(ItemFilter::EditorsChoice).limit(limit)).await
}

#[instrument(skip_all)]
pub async fn distinct_tags(store: &dyn ContentStore) -> Result<Vec<String>, IndexError> {
    Ok(store.distinct_tags().await?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryItems {
    pub category: String,
    pub items: Vec<ItemView>,
}

/// Top items per category, keyed by category name in listing order.
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemsByCategory(Vec<CategoryItems>);

impl ItemsByCategory {
    pub fn get(&self, category: &str) -> Option<&[ItemView]> {
        self.0
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.items.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryItems> {
        self.0.iter()
    }
}

impl Serialize for ItemsByCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.category, &entry.items)?;
        }
        map.end()
    }
}

/// Up to `limit` items for each category, in insertion order. Rejects the
/// input when two categories share a name, since the result is keyed by name.
#[instrument(skip(store, categories), fields(categories = categories.len()))]
pub async fn category_top(
    store: &dyn ContentStore,
    categories: &[Category],
    limit: u64,
) -> Result<ItemsByCategory, IndexError> {
    let mut seen = HashSet::new();
    for category in categories {
        if !seen.insert(category.name.as_str()) {
            return Err(IndexError::DuplicateCategory(category.name.clone()));
        }
    }

    let entries = try_join_all(categories.iter().map(|category| async move {
        let items = select(
            store,
            ItemQuery::new(ItemFilter::Category(category.id)).limit(limit),
        )
        .await?;
        Ok::<_, IndexError>(CategoryItems {
            category: category.name.clone(),
            items,
        })
    }))
    .await?;
    Ok(ItemsByCategory(entries))
}
