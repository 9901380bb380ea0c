use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown for items whose category reference is unset or dangling.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category_id: Option<i64>,
    pub tags: Vec<String>,
    pub views: i64,
    pub is_editors_choice: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteSetting {
    pub id: i64,
    pub key: String,
    pub value: String,
}

/// Fields needed to insert a content item; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewContentItem {
    pub title: String,
    pub slug: String,
    pub category_id: Option<i64>,
    pub tags: Vec<String>,
    pub views: i64,
    pub is_editors_choice: bool,
    pub created_at: DateTime<Utc>,
}

impl NewContentItem {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            slug: slugify(&title),
            title,
            category_id: None,
            tags: Vec::new(),
            views: 0,
            is_editors_choice: false,
            created_at: Utc::now(),
        }
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn views(mut self, views: i64) -> Self {
        self.views = views;
        self
    }

    pub fn editors_choice(mut self, flag: bool) -> Self {
        self.is_editors_choice = flag;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Lowercase, ASCII-alphanumeric words joined by `-`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
