//! Uniform random recipe selection that does not assume dense ids.

use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::db::{CatalogStore, Recipe};
use crate::errors::{CatalogError, CatalogResult};

const PICK_ATTEMPTS: usize = 3;

/// Pick a recipe uniformly at random; `None` when the catalog is empty
pub async fn pick_random(store: &CatalogStore) -> CatalogResult<Option<Recipe>> {
    let mut rng = rand::rngs::StdRng::from_entropy();
    pick_random_with(store, &mut rng).await
}

/// Same as [`pick_random`] with a caller-supplied RNG.
///
/// Draws a random offset into the id-ordered table rather than a random id,
/// so gaps left by deleted recipes cannot produce misses.
pub async fn pick_random_with<R: Rng + Send>(
    store: &CatalogStore,
    rng: &mut R,
) -> CatalogResult<Option<Recipe>> {
    for attempt in 1..=PICK_ATTEMPTS {
        let count = store.count_recipes(None).await?;
        if count == 0 {
            return Ok(None);
        }

        let offset = rng.gen_range(0..count);
        let picked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM recipes ORDER BY id ASC LIMIT 1 OFFSET ?1")
                .bind(offset)
                .fetch_optional(store.pool())
                .await?;

        let Some(recipe_id) = picked else {
            debug!(attempt, offset, count, "Random offset fell past the end, retrying");
            continue;
        };

        match store.get_recipe(recipe_id).await {
            Ok(recipe) => return Ok(Some(recipe)),
            Err(CatalogError::NotFound { .. }) => {
                debug!(attempt, recipe_id, "Picked recipe was deleted meanwhile, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}
