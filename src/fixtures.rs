//! YAML fixture loader used by `content-index seed`.
//!
//! Fixtures are trusted demo/test data: they are inserted as-is without the
//! validation a real write path would apply.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

use crate::db::{self, Pool};
use crate::model::{slugify, NewContentItem};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Fixture {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub items: Vec<FixtureItem>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub subscribers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FixtureItem {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub editors_choice: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub items: usize,
    pub settings: usize,
    pub subscribers: usize,
}

pub fn parse(yaml: &str) -> Result<Fixture> {
    serde_yaml::from_str(yaml).context("invalid fixture YAML")
}

pub fn load(path: &Path) -> Result<Fixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    parse(&raw)
}

/// Insert everything in `fixture`. Categories referenced only by items are
/// created on the fly; items without `created_at` are stamped now.
/// `SeedReport::categories` counts only categories that did not exist yet.
#[instrument(skip_all)]
pub async fn seed(pool: &Pool, fixture: &Fixture) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut category_ids: BTreeMap<String, i64> = BTreeMap::new();

    for name in &fixture.categories {
        if !category_ids.contains_key(name) {
            let (id, created) = db::get_or_create_category(pool, name).await?;
            category_ids.insert(name.clone(), id);
            report.categories += usize::from(created);
        }
    }

    for item in &fixture.items {
        let category_id = match &item.category {
            Some(name) => match category_ids.get(name) {
                Some(id) => Some(*id),
                None => {
                    let (id, created) = db::get_or_create_category(pool, name).await?;
                    category_ids.insert(name.clone(), id);
                    report.categories += usize::from(created);
                    Some(id)
                }
            },
            None => None,
        };
        let new_item = NewContentItem {
            title: item.title.clone(),
            slug: item.slug.clone().unwrap_or_else(|| slugify(&item.title)),
            category_id,
            tags: item.tags.clone(),
            views: item.views,
            is_editors_choice: item.editors_choice,
            created_at: item.created_at.unwrap_or_else(Utc::now),
        };
        db::insert_item(pool, &new_item).await?;
        report.items += 1;
    }

    for (key, value) in &fixture.settings {
        db::upsert_setting(pool, key, value).await?;
        report.settings += 1;
    }

    for email in &fixture.subscribers {
        db::insert_subscriber(pool, email).await?;
        report.subscribers += 1;
    }

    info!(?report, "fixture seeded");
    Ok(report)
}
