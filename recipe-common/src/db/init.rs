//! Database connection
//!
//! The recipes database is produced by the ingestion stage; this module never
//! creates it. Opening fails fast when the file or the `recipes` table is
//! missing, so a run never starts against the wrong database.

use crate::db::table_schemas::sync_all_table_schemas;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open an existing recipes database and bring the `tags` column up to date
///
/// The pool holds a single connection: the tagger is the only writer for the
/// duration of a run.
pub async fn open_database(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}\nRun the ingestion stage first to create and fill the recipes table.",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(false)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    info!("Opened existing database: {}", db_path.display());

    sync_all_table_schemas(&pool).await?;

    let recipe_count = count_recipes(&pool).await?;
    info!("Database contains {} recipes", recipe_count);

    Ok(pool)
}

/// Number of rows in the recipes table
pub async fn count_recipes(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
