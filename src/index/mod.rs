//! Content index aggregation engine.
//!
//! Builds the read-models handed to the presentation layer out of several
//! independent store queries. Every view fans its sub-queries out
//! concurrently under a [`RequestScope`], so a deadline or a cancelled
//! request drops all in-flight queries at once.
//!
//! | Part | Purpose |
//! |------|---------|
//! | [`census`] | Per-category item counts |
//! | [`selectors`] | Bounded, ordered item subsets (popular, recent, ...) |
//! | [`listing`] | Paginated, optionally category-scoped listing |
//! | [`display`] | Category display names for items |
//! | [`views`] | Assembly of the home, listing, dashboard and catalogue views |

pub mod census;
pub mod display;
pub mod listing;
pub mod scope;
pub mod selectors;
pub mod views;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub use census::{category_census, census, CategoryCensus, CategoryCount};
pub use display::{display_category, resolve_items, ItemView};
pub use listing::{paginate, Page, PageRequest};
pub use scope::RequestScope;
pub use selectors::{
    category_top, distinct_tags, editors_choice, popular, recent, ItemsByCategory,
};
pub use views::{
    catalog, catalog_view, dashboard_view, home_view, listing_view, DashboardView, HomeView,
    ListingView,
};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("category '{0}' not found")]
    NotFound(String),
    /// A store round trip failed. Never downgraded to an empty result.
    #[error("backend unavailable: {0:#}")]
    BackendUnavailable(#[from] anyhow::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("two categories share the name '{0}'")]
    DuplicateCategory(String),
    #[error("request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("request cancelled")]
    Cancelled,
}

/// Caps applied by the selectors and the listing. Passed explicitly into
/// every view; nothing here is read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSettings {
    pub page_size: u64,
    pub popular_limit: u64,
    pub sidebar_popular_limit: u64,
    pub recent_limit: u64,
    pub editors_choice_limit: u64,
    pub per_category_limit: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            popular_limit: 5,
            sidebar_popular_limit: 10,
            recent_limit: 5,
            editors_choice_limit: 5,
            per_category_limit: 5,
        }
    }
}
