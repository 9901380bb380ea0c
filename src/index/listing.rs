//! Paginated listing, optionally scoped to one category.
//!
//! The count and the slice share the same filter and the slice always uses
//! insertion order, so `total_pages` and the contents of the last page agree.

use std::num::IntErrorKind;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::store::{ContentStore, ItemFilter, ItemQuery};

use super::display::{resolve_items, ItemView};
use super::IndexError;

/// A 1-indexed page number. Absent, non-numeric and `< 1` inputs clamp to 1;
/// integers too large for `u64` saturate to `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest(u64);

impl PageRequest {
    pub const FIRST: PageRequest = PageRequest(1);

    pub fn new(page: u64) -> Self {
        Self(page.max(1))
    }

    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::FIRST;
        };
        match raw.parse::<u64>() {
            Ok(n) => Self::new(n),
            Err(err) if *err.kind() == IntErrorKind::PosOverflow => Self(u64::MAX),
            Err(_) => {
                debug!(raw, "page parameter clamped to 1");
                Self::FIRST
            }
        }
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::FIRST
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub items: Vec<ItemView>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub skip: u64,
    /// 1-indexed display number of the first item on this page.
    pub starting_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Page {
    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Fetch page `request` of size `page_size`.
///
/// With `category`, the listing is restricted to that category and fails
/// with [`IndexError::NotFound`] when no category has that name. Any page
/// past the end, however large, yields an empty slice; `skip` and
/// `starting_count` saturate at `u64::MAX`.
#[instrument(skip(store))]
pub async fn paginate(
    store: &dyn ContentStore,
    request: PageRequest,
    page_size: u64,
    category: Option<&str>,
) -> Result<Page, IndexError> {
    if page_size == 0 {
        return Err(IndexError::InvalidInput("page size must be > 0".into()));
    }
    let page = request.number();
    let skip = (page - 1).saturating_mul(page_size);
    let starting_count = skip.saturating_add(1);

    let filter = match category {
        Some(name) => {
            let found = store
                .find_category_by_name(name)
                .await?
                .ok_or_else(|| IndexError::NotFound(name.to_string()))?;
            ItemFilter::Category(found.id)
        }
        None => ItemFilter::All,
    };

    let query = ItemQuery::new(filter).skip(skip).limit(page_size);
    let (total_items, items) = tokio::try_join!(
        async { Ok::<_, IndexError>(store.count_items(&filter).await?) },
        async {
            let items = store.find_items(&query).await?;
            resolve_items(store, items).await
        },
    )?;

    let total_pages = total_items.div_ceil(page_size);
    debug!(page, total_items, total_pages, returned = items.len(), "page assembled");
    Ok(Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
        skip,
        starting_count,
        category: category.map(str::to_string),
    })
}
