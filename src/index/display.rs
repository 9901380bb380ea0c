use std::collections::{BTreeSet, HashMap};

use futures::future::try_join_all;
use serde::Serialize;

use crate::model::{Category, ContentItem, UNCATEGORIZED};
use crate::store::ContentStore;

use super::IndexError;

/// A content item paired with the display name of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: ContentItem,
    pub category: String,
}

/// Category label for `item`. Falls back to [`UNCATEGORIZED`] when the item
/// has no category or `resolved` is missing or belongs to another id.
pub fn display_category(item: &ContentItem, resolved: Option<&Category>) -> String {
    match (item.category_id, resolved) {
        (Some(id), Some(category)) if category.id == id => category.name.clone(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Resolve the category reference of every item, one lookup per distinct id.
pub async fn resolve_items(
    store: &dyn ContentStore,
    items: Vec<ContentItem>,
) -> Result<Vec<ItemView>, IndexError> {
    let ids: BTreeSet<i64> = items.iter().filter_map(|i| i.category_id).collect();
    let resolved = try_join_all(ids.into_iter().map(|id| async move {
        Ok::<_, IndexError>((id, store.resolve_category(id).await?))
    }))
    .await?;
    let lookup: HashMap<i64, Category> = resolved
        .into_iter()
        .filter_map(|(id, category)| category.map(|c| (id, c)))
        .collect();

    Ok(items
        .into_iter()
        .map(|item| {
            let category = display_category(
                &item,
                item.category_id.and_then(|id| lookup.get(&id)),
            );
            ItemView { item, category }
        })
        .collect())
}
