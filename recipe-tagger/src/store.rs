//! Tag storage
//!
//! The tagger writes exactly one column, `recipes.tags`, matched by primary
//! key. Reads are limited to enumerating `id` (ascending) and the current
//! `tags` value.

use async_trait::async_trait;
use recipe_common::db::StoredRecipe;
use recipe_common::Result;
use sqlx::{Row, SqlitePool};

/// One pending write of an encoded tag string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    pub recipe_id: i64,
    /// Encoded tag set (`", "` separated)
    pub tags: String,
    /// Source title, only used for progress logging
    pub title: Option<String>,
}

/// Destination for batches of tag updates
#[async_trait]
pub trait TagStore: Send {
    /// Apply all updates atomically
    ///
    /// Either every update commits or none does. Returns the number of rows
    /// changed.
    async fn apply_batch(&mut self, updates: &[TagUpdate]) -> Result<u64>;
}

/// SQLite-backed tag store
#[derive(Debug, Clone)]
pub struct SqliteTagStore {
    pool: SqlitePool,
}

impl SqliteTagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All stored recipes in ascending id order
    pub async fn fetch_stored_recipes(&self) -> Result<Vec<StoredRecipe>> {
        let rows = sqlx::query("SELECT id, tags FROM recipes ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<StoredRecipe> {
                Ok(StoredRecipe {
                    id: row.try_get("id")?,
                    tags: row.try_get("tags")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl TagStore for SqliteTagStore {
    async fn apply_batch(&mut self, updates: &[TagUpdate]) -> Result<u64> {
        // Dropping the transaction on error rolls the whole batch back
        let mut tx = self.pool.begin().await?;
        let mut rows_affected = 0;

        for update in updates {
            let result = sqlx::query("UPDATE recipes SET tags = ? WHERE id = ?")
                .bind(&update.tags)
                .bind(update.recipe_id)
                .execute(&mut *tx)
                .await?;
            rows_affected += result.rows_affected();
        }

        tx.commit().await?;

        Ok(rows_affected)
    }
}
