//! Shared fixtures for the integration tests

#![allow(dead_code)]

use anyhow::Result;
use recipebook::db::{CatalogStore, NewRecipe, UserId};
use tempfile::TempDir;

/// A catalog backed by a throwaway database file
pub struct TestCatalog {
    pub store: CatalogStore,
    _dir: TempDir,
}

pub async fn open_catalog() -> Result<TestCatalog> {
    let dir = TempDir::new()?;
    let store = CatalogStore::open(dir.path().join("catalog.db")).await?;
    Ok(TestCatalog { store, _dir: dir })
}

/// Insert a recipe authored by `author`, creating the author if needed
pub async fn add_recipe(
    store: &CatalogStore,
    author: UserId,
    category_id: i64,
    title: &str,
) -> Result<i64> {
    store.upsert_user(author, &format!("Cook {author}")).await?;
    let id = store
        .create_recipe(&NewRecipe {
            title: title.to_string(),
            category_id,
            ingredients: "flour, eggs, milk".to_string(),
            instructions: "Mix and bake.".to_string(),
            author_id: author,
        })
        .await?;
    Ok(id)
}
