use anyhow::Result;
use std::collections::HashSet;

use recipebook::db::CatalogStore;
use recipebook::pagination::list_page;

mod common;
use common::{add_recipe, open_catalog};

/// Walk a listing through `has_next` and return every id seen, in order
async fn walk(store: &CatalogStore, category_id: Option<i64>, page_size: u32) -> Result<(Vec<i64>, u32)> {
    let mut seen = Vec::new();
    let mut page = 0;
    loop {
        let listed = list_page(store, category_id, page, page_size).await?;
        assert_eq!(listed.has_prev, page > 0);
        seen.extend(listed.items.iter().map(|recipe| recipe.id));
        if !listed.has_next {
            return Ok((seen, page + 1));
        }
        page += 1;
        assert!(page < 100, "pagination did not terminate");
    }
}

#[tokio::test]
async fn test_every_recipe_visited_once_around_page_boundaries() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;

    for k in [0usize, 1, 5, 6, 10] {
        let category = store.find_or_create_category(&format!("Batch {k}")).await?.category;
        let mut expected = HashSet::new();
        for n in 0..k {
            expected.insert(add_recipe(store, 1, category.id, &format!("Dish {n:02}")).await?);
        }

        let (seen, pages) = walk(store, Some(category.id), 5).await?;
        let unique: HashSet<i64> = seen.iter().copied().collect();

        assert_eq!(seen.len(), k, "k = {k}");
        assert_eq!(unique, expected, "k = {k}");
        assert_eq!(pages as usize, k.div_ceil(5).max(1), "k = {k}");
    }

    Ok(())
}

#[tokio::test]
async fn test_exact_multiple_has_no_next() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    for n in 0..5 {
        add_recipe(store, 1, 2, &format!("Lunch {n}")).await?;
    }

    let page = list_page(store, Some(2), 0, 5).await?;
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total, 5);
    assert!(!page.has_next);

    Ok(())
}

#[tokio::test]
async fn test_page_beyond_end_is_empty() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    for n in 0..6 {
        add_recipe(store, 1, 3, &format!("Dinner {n}")).await?;
    }

    let page = list_page(store, Some(3), 7, 5).await?;
    assert!(page.is_empty());
    assert!(page.has_prev);
    assert!(!page.has_next);
    assert_eq!(page.total, 6);

    Ok(())
}

#[tokio::test]
async fn test_order_is_stable_for_equal_titles() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(add_recipe(store, 1, 1, "Porridge").await?);
    }
    add_recipe(store, 1, 1, "Avocado toast").await?;

    let first = list_page(store, Some(1), 0, 3).await?;
    let second = list_page(store, Some(1), 1, 3).await?;

    assert_eq!(first.items[0].title, "Avocado toast");
    let porridge: Vec<i64> = first
        .items
        .iter()
        .chain(second.items.iter())
        .filter(|recipe| recipe.title == "Porridge")
        .map(|recipe| recipe.id)
        .collect();
    assert_eq!(porridge, ids);

    Ok(())
}

#[tokio::test]
async fn test_unfiltered_listing_spans_categories() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    add_recipe(store, 1, 1, "Omelette").await?;
    add_recipe(store, 1, 4, "Tiramisu").await?;
    add_recipe(store, 1, 6, "Lemonade").await?;

    let (seen, pages) = walk(store, None, 2).await?;
    assert_eq!(seen.len(), 3);
    assert_eq!(pages, 2);

    Ok(())
}

#[tokio::test]
async fn test_zero_page_size_falls_back_to_default() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    for n in 0..7 {
        add_recipe(store, 1, 5, &format!("Bread {n}")).await?;
    }

    let page = list_page(store, Some(5), 0, 0).await?;
    assert_eq!(page.page_size, 5);
    assert_eq!(page.items.len(), 5);
    assert!(page.has_next);

    Ok(())
}
