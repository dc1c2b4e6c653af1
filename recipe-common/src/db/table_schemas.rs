//! Table Schema Definitions
//!
//! The `recipes` table is created and filled by the ingestion stage
//! (`id`, `title`, `ingredients`, `instructions`, `image_path`,
//! `cleaned_ingredients`). Only the columns the tagger reads or writes are
//! declared here; `tags` is the one column this tool owns.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;

/// Recipes table schema as seen by the tagger
pub struct RecipesTableSchema;

impl TableSchema for RecipesTableSchema {
    fn table_name() -> &'static str {
        "recipes"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("title", "TEXT").not_null(),
            ColumnDefinition::new("ingredients", "TEXT"),
            // Comma-space separated category names, NULL until tagged
            ColumnDefinition::new("tags", "TEXT").owned(),
        ]
    }
}

/// Synchronize every table the tagger depends on
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    SchemaSync::sync_table::<RecipesTableSchema>(pool).await
}
