//! # Catalog Store Module
//!
//! Durable relational storage for users, categories, recipes and ratings.
//! The store is an injected service wrapping a SQLite connection pool; every
//! write is a single statement or a single transaction, so callers never see
//! a half-applied change.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, FromRow, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::{is_foreign_key_violation, is_unique_violation, CatalogError, CatalogResult};

/// Stable identifier of a chat user
pub type UserId = i64;

/// Categories seeded into an empty catalog, in insertion order
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Breakfast",
    "Lunch",
    "Dinner",
    "Desserts",
    "Baking",
    "Drinks",
];

const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const CATEGORY_RETRY_LIMIT: usize = 3;
const SEARCH_BATCH_SIZE: i64 = 200;

/// Represents a user in the database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub user_id: UserId,
    pub display_name: String,
}

/// Represents a recipe category
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Result of a find-or-create lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub category: Category,
    /// Whether this call inserted the row
    pub created: bool,
}

/// Represents a recipe row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub category_id: i64,
    pub ingredients: String,
    pub instructions: String,
    pub author_id: UserId,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
}

/// Listing entry: just enough to render a button
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub category_id: i64,
    pub category_name: String,
}

/// Recipe joined with the names needed to display it
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCard {
    pub recipe: Recipe,
    pub category_name: String,
    pub author_name: String,
}

/// A fully collected draft, ready to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub category_id: i64,
    pub ingredients: String,
    pub instructions: String,
    pub author_id: UserId,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            display_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create categories table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            category_id INTEGER NOT NULL REFERENCES categories(id),
            ingredients TEXT NOT NULL,
            instructions TEXT NOT NULL,
            author_id INTEGER NOT NULL REFERENCES users(user_id),
            likes INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
            dislikes INTEGER NOT NULL DEFAULT 0 CHECK (dislikes >= 0),
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ratings (
            user_id INTEGER NOT NULL REFERENCES users(user_id),
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            value INTEGER NOT NULL CHECK (value IN (1, -1)),
            PRIMARY KEY (user_id, recipe_id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create ratings table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_title ON recipes(title, id)")
        .execute(pool)
        .await
        .context("Failed to create recipes title index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recipes_category_title ON recipes(category_id, title, id)",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes category index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_recipe ON ratings(recipe_id)")
        .execute(pool)
        .await
        .context("Failed to create ratings index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Insert the default categories when the catalog has none
pub async fn seed_default_categories(pool: &SqlitePool) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to begin seeding")?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count categories")?;
    if existing > 0 {
        debug!(existing, "Categories already present, skipping seed");
        return Ok(0);
    }

    let now = Utc::now();
    for name in DEFAULT_CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO categories (name, created_at) VALUES (?1, ?2)")
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to seed category {name}"))?;
    }

    tx.commit().await.context("Failed to commit seeded categories")?;
    info!(count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
    Ok(DEFAULT_CATEGORIES.len())
}

/// Count recipes, optionally within one category
pub(crate) async fn count_recipes_with<'e, E>(
    executor: E,
    category_id: Option<i64>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE (?1 IS NULL OR category_id = ?1)")
        .bind(category_id)
        .fetch_one(executor)
        .await
}

/// Fetch one ordered slice of the listing; ties on title are broken by id
pub(crate) async fn list_recipes_with<'e, E>(
    executor: E,
    category_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> Result<Vec<RecipeSummary>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, RecipeSummary>(
        "SELECT r.id, r.title, r.category_id, c.name AS category_name
         FROM recipes r
         JOIN categories c ON c.id = r.category_id
         WHERE (?1 IS NULL OR r.category_id = ?1)
         ORDER BY r.title ASC, r.id ASC
         LIMIT ?2 OFFSET ?3",
    )
    .bind(category_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// Injected handle on the catalog database
#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    /// Connect using a `sqlite://` URL, creating and migrating the database
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?;
        Self::connect_with(options).await
    }

    /// Open (or create) a database file at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path.as_ref());
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        init_database_schema(&pool).await?;
        seed_default_categories(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the user on first contact, refresh the display name afterwards
    pub async fn upsert_user(&self, user_id: UserId, display_name: &str) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO users (user_id, display_name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name
             WHERE users.display_name <> excluded.display_name",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user(&self, user_id: UserId) -> CatalogResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, display_name FROM users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Resolve a category by exact (trimmed) name, inserting it if missing.
    ///
    /// Concurrent callers with the same name all get the same row: the insert
    /// is ignored on the unique constraint and the row is re-read.
    pub async fn find_or_create_category(&self, name: &str) -> CatalogResult<ResolvedCategory> {
        let name = name.trim();
        if name.is_empty() {
            return Err(crate::errors::ValidationError::Empty.into());
        }

        for attempt in 1..=CATEGORY_RETRY_LIMIT {
            let created = match sqlx::query(
                "INSERT INTO categories (name, created_at) VALUES (?1, ?2)
                 ON CONFLICT(name) DO NOTHING",
            )
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            {
                Ok(done) => done.rows_affected() > 0,
                Err(e) if is_unique_violation(&e) => {
                    debug!(category = %name, attempt, "Lost category insert race, re-reading");
                    false
                }
                Err(e) => return Err(e.into()),
            };

            let found = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(category) = found {
                if created {
                    info!(category_id = category.id, category = %category.name, "Category created");
                }
                return Ok(ResolvedCategory { category, created });
            }

            warn!(category = %name, attempt, "Category vanished after insert, retrying");
        }

        Err(CatalogError::Conflict(format!(
            "category {name:?} could not be resolved"
        )))
    }

    pub async fn get_category(&self, category_id: i64) -> CatalogResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// All categories ordered by name
    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Insert a recipe; the single commit point of the creation dialogue
    pub async fn create_recipe(&self, draft: &NewRecipe) -> CatalogResult<i64> {
        info!(author_id = draft.author_id, category_id = draft.category_id, "Creating new recipe");

        let inserted = sqlx::query(
            "INSERT INTO recipes (title, category_id, ingredients, instructions, author_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&draft.title)
        .bind(draft.category_id)
        .bind(&draft.ingredients)
        .bind(&draft.instructions)
        .bind(draft.author_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(done) => {
                let recipe_id = done.last_insert_rowid();
                info!(recipe_id, "Recipe created");
                Ok(recipe_id)
            }
            Err(e) if is_foreign_key_violation(&e) => {
                if self.get_category(draft.category_id).await?.is_none() {
                    Err(CatalogError::category_not_found(draft.category_id))
                } else {
                    Err(CatalogError::NotFound {
                        entity: "user",
                        id: draft.author_id,
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_recipe(&self, recipe_id: i64) -> CatalogResult<Recipe> {
        sqlx::query_as::<_, Recipe>(
            "SELECT id, title, category_id, ingredients, instructions, author_id,
                    likes, dislikes, created_at
             FROM recipes WHERE id = ?1",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::recipe_not_found(recipe_id))
    }

    /// Recipe plus category and author names
    pub async fn get_recipe_card(&self, recipe_id: i64) -> CatalogResult<RecipeCard> {
        let row = sqlx::query(
            "SELECT r.id, r.title, r.category_id, r.ingredients, r.instructions, r.author_id,
                    r.likes, r.dislikes, r.created_at,
                    c.name AS category_name, u.display_name AS author_name
             FROM recipes r
             JOIN categories c ON c.id = r.category_id
             JOIN users u ON u.user_id = r.author_id
             WHERE r.id = ?1",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::recipe_not_found(recipe_id))?;

        Ok(RecipeCard {
            recipe: Recipe::from_row(&row)?,
            category_name: row.try_get("category_name")?,
            author_name: row.try_get("author_name")?,
        })
    }

    /// Remove a recipe; its ratings go with it
    pub async fn delete_recipe(&self, recipe_id: i64) -> CatalogResult<bool> {
        let done = sqlx::query("DELETE FROM recipes WHERE id = ?1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        let deleted = done.rows_affected() > 0;
        if deleted {
            info!(recipe_id, "Recipe deleted");
        }
        Ok(deleted)
    }

    pub async fn list_recipes(
        &self,
        category_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> CatalogResult<Vec<RecipeSummary>> {
        Ok(list_recipes_with(&self.pool, category_id, offset.max(0), limit.max(0)).await?)
    }

    pub async fn count_recipes(&self, category_id: Option<i64>) -> CatalogResult<i64> {
        Ok(count_recipes_with(&self.pool, category_id).await?)
    }

    /// Case-insensitive substring search over titles only.
    ///
    /// Matching happens after Unicode lowercasing in Rust; SQLite's `LIKE`
    /// only folds ASCII. The listing is scanned in batches of summary rows and
    /// the scan stops as soon as `limit` matches are found.
    pub async fn search_recipes_by_title(
        &self,
        query: &str,
        limit: usize,
    ) -> CatalogResult<Vec<RecipeSummary>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(crate::errors::ValidationError::Empty.into());
        }

        let mut matches = Vec::new();
        let mut offset = 0;
        while matches.len() < limit {
            let batch = list_recipes_with(&self.pool, None, offset, SEARCH_BATCH_SIZE).await?;
            let fetched = batch.len() as i64;
            let remaining = limit - matches.len();

            matches.extend(
                batch
                    .into_iter()
                    .filter(|recipe| recipe.title.to_lowercase().contains(&needle))
                    .take(remaining),
            );

            if fetched < SEARCH_BATCH_SIZE {
                break;
            }
            offset += fetched;
        }

        debug!(query = %needle, matches = matches.len(), "Title search completed");
        Ok(matches)
    }
}
