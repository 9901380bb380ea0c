//! SQLite-backed [`ContentStore`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use crate::db::{CategoryRow, ItemRow};
use crate::model::{Category, ContentItem, SiteSetting};

use super::{ContentStore, ItemFilter, ItemQuery, SortKey};

const ITEM_COLUMNS: &str =
    "SELECT id, title, slug, category_id, tags, views, is_editors_choice, created_at FROM content_items";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter) {
    match filter {
        ItemFilter::All => {}
        ItemFilter::Category(id) => {
            qb.push(" WHERE category_id = ").push_bind(*id);
        }
        ItemFilter::EditorsChoice => {
            qb.push(" WHERE is_editors_choice = 1");
        }
    }
}

fn order_clause(sort: Option<SortKey>) -> &'static str {
    match sort {
        Some(SortKey::ViewsDesc) => " ORDER BY views DESC, id DESC",
        Some(SortKey::CreatedDesc) => " ORDER BY created_at DESC, id DESC",
        None => " ORDER BY id ASC",
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ContentStore for SqliteStore {
    #[instrument(skip_all)]
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name, created_at FROM categories ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Category::try_from).collect()
    }

    #[instrument(skip_all)]
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, created_at FROM categories WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Category::try_from).transpose()
    }

    #[instrument(skip_all)]
    async fn resolve_category(&self, id: i64) -> Result<Option<Category>> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, created_at FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Category::try_from).transpose()
    }

    #[instrument(skip_all)]
    async fn find_items(&self, query: &ItemQuery) -> Result<Vec<ContentItem>> {
        let mut qb = QueryBuilder::<Sqlite>::new(ITEM_COLUMNS);
        push_filter(&mut qb, &query.filter);
        qb.push(order_clause(query.sort));
        // SQLite only accepts OFFSET after LIMIT; -1 means unbounded.
        qb.push(" LIMIT ")
            .push_bind(query.limit.map_or(-1, to_i64))
            .push(" OFFSET ")
            .push_bind(to_i64(query.skip));

        let rows: Vec<ItemRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(filter = ?query.filter, sort = ?query.sort, rows = rows.len(), "find_items");
        rows.into_iter().map(ContentItem::try_from).collect()
    }

    #[instrument(skip_all)]
    async fn count_items(&self, filter: &ItemFilter) -> Result<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM content_items");
        push_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip_all)]
    async fn distinct_tags(&self) -> Result<Vec<String>> {
        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT j.value FROM content_items, json_each(content_items.tags) AS j \
             WHERE j.type = 'text' ORDER BY j.value ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    #[instrument(skip_all)]
    async fn list_settings(&self) -> Result<Vec<SiteSetting>> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, key, value FROM site_settings ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, key, value)| SiteSetting { id, key, value })
            .collect())
    }

    #[instrument(skip_all)]
    async fn count_categories(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip_all)]
    async fn count_subscribers(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
