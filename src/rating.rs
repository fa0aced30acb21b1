//! # Rating Aggregator Module
//!
//! Like/dislike toggling per (user, recipe) pair. The `likes`/`dislikes`
//! columns on `recipes` are a materialized count of the `ratings` rows and are
//! only ever changed here, in the same transaction as the row they mirror.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{CatalogStore, UserId};
use crate::errors::{CatalogError, CatalogResult};

/// A single vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingValue {
    Like,
    Dislike,
}

impl RatingValue {
    /// Stored representation: +1 or -1
    pub fn as_i64(self) -> i64 {
        match self {
            RatingValue::Like => 1,
            RatingValue::Dislike => -1,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(RatingValue::Like),
            -1 => Some(RatingValue::Dislike),
            _ => None,
        }
    }
}

/// What a call to [`apply_rating`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    /// First vote from this user
    Applied,
    /// Vote switched sides
    Changed,
    /// Same button pressed again: vote retracted
    Reverted,
}

/// Outcome plus the counters as committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingResult {
    pub outcome: RatingOutcome,
    pub likes: i64,
    pub dislikes: i64,
}

/// Decide the transition and the `(likes, dislikes)` deltas it implies
pub fn plan_transition(
    previous: Option<RatingValue>,
    value: RatingValue,
) -> (RatingOutcome, i64, i64) {
    let unit = |v: RatingValue| match v {
        RatingValue::Like => (1, 0),
        RatingValue::Dislike => (0, 1),
    };

    match previous {
        None => {
            let (l, d) = unit(value);
            (RatingOutcome::Applied, l, d)
        }
        Some(old) if old == value => {
            let (l, d) = unit(value);
            (RatingOutcome::Reverted, -l, -d)
        }
        Some(old) => {
            let (ol, od) = unit(old);
            let (nl, nd) = unit(value);
            (RatingOutcome::Changed, nl - ol, nd - od)
        }
    }
}

/// Apply a like/dislike toggle atomically.
///
/// The transaction starts by writing the recipe row, which takes SQLite's
/// write lock before the existing vote is read; concurrent toggles on the
/// same pair therefore run one after another and never act on a stale read.
pub async fn apply_rating(
    store: &CatalogStore,
    user_id: UserId,
    recipe_id: i64,
    value: RatingValue,
) -> CatalogResult<RatingResult> {
    let mut tx = store.pool().begin().await?;

    let locked = sqlx::query("UPDATE recipes SET likes = likes WHERE id = ?1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;
    if locked.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(CatalogError::recipe_not_found(recipe_id));
    }

    let previous: Option<i64> =
        sqlx::query_scalar("SELECT value FROM ratings WHERE user_id = ?1 AND recipe_id = ?2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(&mut *tx)
            .await?;
    let previous = previous.and_then(RatingValue::from_i64);

    let (outcome, likes_delta, dislikes_delta) = plan_transition(previous, value);

    match outcome {
        RatingOutcome::Applied => {
            sqlx::query("INSERT INTO ratings (user_id, recipe_id, value) VALUES (?1, ?2, ?3)")
                .bind(user_id)
                .bind(recipe_id)
                .bind(value.as_i64())
                .execute(&mut *tx)
                .await?;
        }
        RatingOutcome::Reverted => {
            sqlx::query("DELETE FROM ratings WHERE user_id = ?1 AND recipe_id = ?2")
                .bind(user_id)
                .bind(recipe_id)
                .execute(&mut *tx)
                .await?;
        }
        RatingOutcome::Changed => {
            sqlx::query("UPDATE ratings SET value = ?3 WHERE user_id = ?1 AND recipe_id = ?2")
                .bind(user_id)
                .bind(recipe_id)
                .bind(value.as_i64())
                .execute(&mut *tx)
                .await?;
        }
    }

    let (likes, dislikes): (i64, i64) = sqlx::query_as(
        "UPDATE recipes SET likes = likes + ?2, dislikes = dislikes + ?3
         WHERE id = ?1
         RETURNING likes, dislikes",
    )
    .bind(recipe_id)
    .bind(likes_delta)
    .bind(dislikes_delta)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(user_id, recipe_id, outcome = ?outcome, likes, dislikes, "Rating applied");
    Ok(RatingResult {
        outcome,
        likes,
        dislikes,
    })
}

/// The vote a user currently has on a recipe, if any
pub async fn current_rating(
    store: &CatalogStore,
    user_id: UserId,
    recipe_id: i64,
) -> CatalogResult<Option<RatingValue>> {
    let value: Option<i64> =
        sqlx::query_scalar("SELECT value FROM ratings WHERE user_id = ?1 AND recipe_id = ?2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(store.pool())
            .await?;

    debug!(user_id, recipe_id, value = ?value, "Looked up current rating");
    Ok(value.and_then(RatingValue::from_i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_vote_increments_its_counter() {
        assert_eq!(
            plan_transition(None, RatingValue::Like),
            (RatingOutcome::Applied, 1, 0)
        );
        assert_eq!(
            plan_transition(None, RatingValue::Dislike),
            (RatingOutcome::Applied, 0, 1)
        );
    }

    #[test]
    fn test_same_vote_twice_reverts() {
        assert_eq!(
            plan_transition(Some(RatingValue::Like), RatingValue::Like),
            (RatingOutcome::Reverted, -1, 0)
        );
        assert_eq!(
            plan_transition(Some(RatingValue::Dislike), RatingValue::Dislike),
            (RatingOutcome::Reverted, 0, -1)
        );
    }

    #[test]
    fn test_switching_sides_moves_one_vote() {
        assert_eq!(
            plan_transition(Some(RatingValue::Like), RatingValue::Dislike),
            (RatingOutcome::Changed, -1, 1)
        );
        assert_eq!(
            plan_transition(Some(RatingValue::Dislike), RatingValue::Like),
            (RatingOutcome::Changed, 1, -1)
        );
    }

    #[test]
    fn test_stored_value_mapping() {
        assert_eq!(RatingValue::from_i64(1), Some(RatingValue::Like));
        assert_eq!(RatingValue::from_i64(-1), Some(RatingValue::Dislike));
        assert_eq!(RatingValue::from_i64(0), None);
        assert_eq!(RatingValue::Dislike.as_i64(), -1);
    }
}
