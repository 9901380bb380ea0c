//! Row models returned by SQL queries.
//!
//! Timestamps are stored as Unix milliseconds and tags as a JSON array so that
//! ordering by `created_at` is numeric and items stay single-row.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::FromRow;

use crate::model::{Category, ContentItem};

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category_id: Option<i64>,
    pub tags: String,
    pub views: i64,
    pub is_editors_choice: bool,
    pub created_at: i64,
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| anyhow!("timestamp {} out of range", ms))
}

impl TryFrom<CategoryRow> for Category {
    type Error = anyhow::Error;

    fn try_from(row: CategoryRow) -> Result<Self> {
        Ok(Category {
            id: row.id,
            name: row.name,
            created_at: from_millis(row.created_at)?,
        })
    }
}

impl TryFrom<ItemRow> for ContentItem {
    type Error = anyhow::Error;

    fn try_from(row: ItemRow) -> Result<Self> {
        let tags: Vec<String> = serde_json::from_str(&row.tags)
            .with_context(|| format!("item {} has malformed tags", row.id))?;
        Ok(ContentItem {
            id: row.id,
            title: row.title,
            slug: row.slug,
            category_id: row.category_id,
            tags,
            views: row.views,
            is_editors_choice: row.is_editors_choice,
            created_at: from_millis(row.created_at)?,
        })
    }
}
