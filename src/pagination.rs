//! # Pagination Engine Module
//!
//! Bounded, stable windows over the recipe listing. `has_next` comes from the
//! real remaining count, so a listing whose size is an exact multiple of the
//! page size never offers a "next" button that leads nowhere.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::db::{count_recipes_with, list_recipes_with, CatalogStore, RecipeSummary};
use crate::errors::CatalogResult;

/// Direction of a navigation button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageNav {
    Prev,
    Next,
}

/// Page reached by pressing `nav` while looking at `current`
pub fn resolve_page(current: u32, nav: PageNav) -> u32 {
    match nav {
        PageNav::Prev => current.saturating_sub(1),
        PageNav::Next => current.saturating_add(1),
    }
}

/// One window of the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<RecipeSummary>,
    pub category_id: Option<i64>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// List page `page` (zero-based), optionally filtered by category.
///
/// Count and slice are read inside one transaction so they describe the same
/// snapshot of the catalog.
pub async fn list_page(
    store: &CatalogStore,
    category_id: Option<i64>,
    page: u32,
    page_size: u32,
) -> CatalogResult<Page> {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    let offset = i64::from(page) * i64::from(page_size);

    let mut tx = store.pool().begin().await?;
    let total = count_recipes_with(&mut *tx, category_id).await?;
    let items = list_recipes_with(&mut *tx, category_id, offset, i64::from(page_size)).await?;
    tx.commit().await?;

    let has_next = total > offset + items.len() as i64;
    debug!(
        category_id = ?category_id,
        page,
        total,
        items = items.len(),
        has_next,
        "Listed recipe page"
    );

    Ok(Page {
        items,
        category_id,
        page,
        page_size,
        total,
        has_prev: page > 0,
        has_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prev_from_first_page_clamps() {
        assert_eq!(resolve_page(0, PageNav::Prev), 0);
        assert_eq!(resolve_page(3, PageNav::Prev), 2);
    }

    #[test]
    fn test_next_never_overflows() {
        assert_eq!(resolve_page(0, PageNav::Next), 1);
        assert_eq!(resolve_page(u32::MAX, PageNav::Next), u32::MAX);
    }
}
