//! Per-category item counts, recomputed on every request.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::model::Category;
use crate::store::{ContentStore, ItemFilter};

use super::IndexError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Category name to item count, in category listing order. Categories with
/// no items keep an explicit zero entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCensus(Vec<CategoryCount>);

impl CategoryCensus {
    pub fn get(&self, category: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|c| c.count).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryCount> {
        self.0.iter()
    }
}

/// Count the items of every category in `categories` with one concurrent
/// count query each. Any failed count fails the whole census.
#[instrument(skip_all, fields(categories = categories.len()))]
pub async fn category_census(
    store: &dyn ContentStore,
    categories: &[Category],
) -> Result<CategoryCensus, IndexError> {
    let counts = try_join_all(categories.iter().map(|category| async move {
        let count = store
            .count_items(&ItemFilter::Category(category.id))
            .await?;
        debug!(category = %category.name, count, "counted category");
        Ok::<_, IndexError>(CategoryCount {
            category: category.name.clone(),
            count,
        })
    }))
    .await?;
    Ok(CategoryCensus(counts))
}

/// List the categories, then run [`category_census`] over them.
pub async fn census(store: &dyn ContentStore) -> Result<CategoryCensus, IndexError> {
    let categories = store.list_categories().await?;
    category_census(store, &categories).await
}
