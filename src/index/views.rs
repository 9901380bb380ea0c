//! Request-scoped read-models.
//!
//! Each view dispatches all of its sub-queries at once and merges the
//! results. A single failure aborts the view; nothing is returned half-built.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::model::SiteSetting;
use crate::store::{ContentStore, ItemFilter, ItemQuery};

use super::census::{category_census, census, CategoryCensus};
use super::display::{resolve_items, ItemView};
use super::listing::{paginate, Page, PageRequest};
use super::scope::RequestScope;
use super::selectors::{
    category_top, distinct_tags, editors_choice, popular, recent, ItemsByCategory,
};
use super::{IndexError, IndexSettings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeView {
    pub category_counts: CategoryCensus,
    pub popular_items: Vec<ItemView>,
    pub recent_items: Vec<ItemView>,
    pub editors_choice_items: Vec<ItemView>,
    pub distinct_tags: Vec<String>,
    pub items_by_category: ItemsByCategory,
    pub catalog: Vec<ItemView>,
    pub settings: Vec<SiteSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub page: Page,
    pub category_counts: CategoryCensus,
    pub popular_items: Vec<ItemView>,
    pub recent_items: Vec<ItemView>,
    pub settings: Vec<SiteSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub item_count: u64,
    pub category_count: u64,
    pub subscriber_count: u64,
    pub settings: Vec<SiteSetting>,
}

async fn site_settings(store: &dyn ContentStore) -> Result<Vec<SiteSetting>, IndexError> {
    Ok(store.list_settings().await?)
}

fn log_outcome<T>(view: &'static str, res: &Result<T, IndexError>) {
    match res {
        Ok(_) => info!(view, "view assembled"),
        Err(err) => warn!(view, error = %err, "view aborted"),
    }
}

/// Every content item in insertion order with its category label.
#[instrument(skip_all)]
pub async fn catalog(store: &dyn ContentStore) -> Result<Vec<ItemView>, IndexError> {
    let items = store.find_items(&ItemQuery::new(ItemFilter::All)).await?;
    resolve_items(store, items).await
}

pub async fn catalog_view(
    store: &dyn ContentStore,
    scope: &RequestScope,
) -> Result<Vec<ItemView>, IndexError> {
    let res = scope.run(catalog(store)).await;
    log_outcome("catalog", &res);
    res
}

#[instrument(skip_all)]
pub async fn home_view(
    store: &dyn ContentStore,
    settings: &IndexSettings,
    scope: &RequestScope,
) -> Result<HomeView, IndexError> {
    let by_category = async {
        let categories = store.list_categories().await.map_err(IndexError::from)?;
        tokio::try_join!(
            category_census(store, &categories),
            category_top(store, &categories, settings.per_category_limit),
        )
    };

    let res = scope
        .run(async {
            let (
                (category_counts, items_by_category),
                popular_items,
                recent_items,
                editors_choice_items,
                tags,
                all_items,
                site,
            ) = tokio::try_join!(
                by_category,
                popular(store, settings.popular_limit),
                recent(store, settings.recent_limit),
                editors_choice(store, settings.editors_choice_limit),
                distinct_tags(store),
                catalog(store),
                site_settings(store),
            )?;
            Ok(HomeView {
                category_counts,
                popular_items,
                recent_items,
                editors_choice_items,
                distinct_tags: tags,
                items_by_category,
                catalog: all_items,
                settings: site,
            })
        })
        .await;
    log_outcome("home", &res);
    res
}

#[instrument(skip(store, settings, scope))]
pub async fn listing_view(
    store: &dyn ContentStore,
    settings: &IndexSettings,
    scope: &RequestScope,
    request: PageRequest,
    category: Option<&str>,
) -> Result<ListingView, IndexError> {
    let res = scope
        .run(async {
            let (page, category_counts, popular_items, recent_items, site) = tokio::try_join!(
                paginate(store, request, settings.page_size, category),
                census(store),
                popular(store, settings.sidebar_popular_limit),
                recent(store, settings.recent_limit),
                site_settings(store),
            )?;
            Ok(ListingView {
                page,
                category_counts,
                popular_items,
                recent_items,
                settings: site,
            })
        })
        .await;
    log_outcome("listing", &res);
    res
}

#[instrument(skip_all)]
pub async fn dashboard_view(
    store: &dyn ContentStore,
    scope: &RequestScope,
) -> Result<DashboardView, IndexError> {
    let res = scope
        .run(async {
            let (item_count, category_count, subscriber_count, site) = tokio::try_join!(
                async { Ok::<_, IndexError>(store.count_items(&ItemFilter::All).await?) },
                async { Ok::<_, IndexError>(store.count_categories().await?) },
                async { Ok::<_, IndexError>(store.count_subscribers().await?) },
                site_settings(store),
            )?;
            Ok(DashboardView {
                item_count,
                category_count,
                subscriber_count,
                settings: site,
            })
        })
        .await;
    log_outcome("dashboard", &res);
    res
}
