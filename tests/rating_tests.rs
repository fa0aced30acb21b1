use anyhow::Result;
use recipebook::db::CatalogStore;
use recipebook::errors::CatalogError;
use recipebook::rating::{apply_rating, current_rating, RatingOutcome, RatingValue};

mod common;
use common::{add_recipe, open_catalog};

async fn rating_rows(store: &CatalogStore, recipe_id: i64) -> Result<i64> {
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE recipe_id = ?1")
        .bind(recipe_id)
        .fetch_one(store.pool())
        .await?;
    Ok(rows)
}

/// Counters must equal the rating rows they summarize
async fn assert_counters_consistent(store: &CatalogStore, recipe_id: i64) -> Result<()> {
    let (likes, dislikes): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(value = 1), 0), COALESCE(SUM(value = -1), 0)
         FROM ratings WHERE recipe_id = ?1",
    )
    .bind(recipe_id)
    .fetch_one(store.pool())
    .await?;

    let recipe = store.get_recipe(recipe_id).await?;
    assert_eq!((recipe.likes, recipe.dislikes), (likes, dislikes));
    Ok(())
}

#[tokio::test]
async fn test_like_twice_reverts() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    let recipe_id = add_recipe(store, 1, 1, "Omelette").await?;
    store.upsert_user(2, "Bob").await?;

    let first = apply_rating(store, 2, recipe_id, RatingValue::Like).await?;
    assert_eq!(first.outcome, RatingOutcome::Applied);
    assert_eq!((first.likes, first.dislikes), (1, 0));

    let second = apply_rating(store, 2, recipe_id, RatingValue::Like).await?;
    assert_eq!(second.outcome, RatingOutcome::Reverted);
    assert_eq!((second.likes, second.dislikes), (0, 0));

    assert_eq!(rating_rows(store, recipe_id).await?, 0);
    assert_eq!(current_rating(store, 2, recipe_id).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_like_then_dislike_switches() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    let recipe_id = add_recipe(store, 1, 1, "Omelette").await?;
    store.upsert_user(2, "Bob").await?;

    apply_rating(store, 2, recipe_id, RatingValue::Like).await?;
    let switched = apply_rating(store, 2, recipe_id, RatingValue::Dislike).await?;

    assert_eq!(switched.outcome, RatingOutcome::Changed);
    assert_eq!((switched.likes, switched.dislikes), (0, 1));
    assert_eq!(rating_rows(store, recipe_id).await?, 1);
    assert_eq!(
        current_rating(store, 2, recipe_id).await?,
        Some(RatingValue::Dislike)
    );
    assert_counters_consistent(store, recipe_id).await?;

    Ok(())
}

#[tokio::test]
async fn test_rating_missing_recipe_changes_nothing() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    store.upsert_user(2, "Bob").await?;

    let result = apply_rating(store, 2, 404, RatingValue::Like).await;
    assert!(matches!(result, Err(CatalogError::NotFound { entity: "recipe", id: 404 })));
    assert_eq!(rating_rows(store, 404).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_votes_from_many_users() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    let recipe_id = add_recipe(store, 1, 1, "Waffles").await?;

    for user_id in 100..120 {
        store.upsert_user(user_id, "Voter").await?;
    }

    let handles: Vec<_> = (100..120)
        .map(|user_id| {
            let store = store.clone();
            let value = if user_id % 4 == 0 {
                RatingValue::Dislike
            } else {
                RatingValue::Like
            };
            tokio::spawn(async move { apply_rating(&store, user_id, recipe_id, value).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let recipe = store.get_recipe(recipe_id).await?;
    assert_eq!(recipe.likes + recipe.dislikes, 20);
    assert_eq!(recipe.dislikes, 5);
    assert_counters_consistent(store, recipe_id).await?;

    Ok(())
}

#[tokio::test]
async fn test_concurrent_toggles_from_one_user_serialize() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    let recipe_id = add_recipe(store, 1, 1, "Waffles").await?;
    store.upsert_user(2, "Bob").await?;

    // An even number of identical toggles always ends where it started
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { apply_rating(&store, 2, recipe_id, RatingValue::Like).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let recipe = store.get_recipe(recipe_id).await?;
    assert_eq!((recipe.likes, recipe.dislikes), (0, 0));
    assert_eq!(rating_rows(store, recipe_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_deleting_recipe_drops_its_ratings() -> Result<()> {
    let catalog = open_catalog().await?;
    let store = &catalog.store;
    let recipe_id = add_recipe(store, 1, 1, "Crepes").await?;
    apply_rating(store, 1, recipe_id, RatingValue::Like).await?;

    assert!(store.delete_recipe(recipe_id).await?);
    assert_eq!(rating_rows(store, recipe_id).await?, 0);

    Ok(())
}
