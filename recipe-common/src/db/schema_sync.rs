//! Automatic Schema Synchronization
//!
//! The `recipes` table is created by the ingestion stage; the tagger only owns
//! the `tags` column. Schema definitions in code are compared against
//! `PRAGMA table_info` and missing nullable columns are added with
//! `ALTER TABLE ADD COLUMN`.
//!
//! # Usage
//!
//! ```rust,ignore
//! SchemaSync::sync_table::<RecipesTableSchema>(&pool).await?;
//! ```

use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// Column belongs to this tool and may be added when missing
    pub owned: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            owned: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as owned (added automatically when missing)
    pub fn owned(mut self) -> Self {
        self.owned = true;
        self
    }
}

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    /// Column ID (position in table)
    pub cid: i32,
    pub name: String,
    /// SQL type from PRAGMA table_info
    pub type_name: String,
    pub not_null: bool,
    /// PRIMARY KEY flag
    pub pk: bool,
}

/// Schema drift detected between expected and actual schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Owned column missing from database (fixable)
    MissingColumn { table: String, column: ColumnDefinition },
    /// Column maintained by another stage is missing (not fixable here)
    MissingForeignColumn { table: String, column: String },
    /// Column type mismatch (cannot auto-fix)
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
}

/// Defines expected schema for a database table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Expected column definitions
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Schema introspection via PRAGMA table_info
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read actual columns in database order (by cid)
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                pk: row.get::<i32, _>("pk") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);

        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Schema comparison
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare expected schema to actual database schema
    pub fn compare(table_name: &str, expected: &[ColumnDefinition], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for expected_col in expected {
            match actual.iter().find(|c| c.name.eq_ignore_ascii_case(&expected_col.name)) {
                Some(actual_col) => {
                    if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                        drift.push(SchemaDrift::TypeMismatch {
                            table: table_name.to_string(),
                            column: expected_col.name.clone(),
                            expected: expected_col.sql_type.clone(),
                            actual: actual_col.type_name.clone(),
                        });
                    }
                }
                None if expected_col.owned => drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                }),
                None => drift.push(SchemaDrift::MissingForeignColumn {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                }),
            }
        }

        drift
    }

    /// SQLite type affinity check
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        // INTEGER affinity
        if exp.contains("INT") && act.contains("INT") {
            return true;
        }

        // TEXT affinity
        let is_text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
        is_text(&exp) && is_text(&act)
    }
}

/// Schema synchronization
pub struct SchemaSync;

impl SchemaSync {
    /// Detect drift and add missing owned columns
    ///
    /// A missing table or a missing column owned by the ingestion stage is a
    /// fatal error: the tagger cannot run against a database it does not
    /// understand. Type mismatches are only reported.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
        let table_name = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            return Err(Error::NotFound(format!("Table '{}' not found in database", table_name)));
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            info!("Schema up to date for '{}'", table_name);
            return Ok(());
        }

        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                }
                SchemaDrift::MissingForeignColumn { table, column } => {
                    return Err(Error::InvalidInput(format!(
                        "Column {}.{} is missing; the database was not produced by the ingestion stage",
                        table, column
                    )));
                }
                SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                    warn!(
                        "Type mismatch in {}.{}: expected '{}', found '{}'",
                        table, column, expected, actual
                    );
                }
            }
        }

        Ok(())
    }

    /// Add missing nullable column via ALTER TABLE ADD COLUMN
    pub(crate) async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        // SQLite cannot add PRIMARY KEY or NOT NULL-without-default columns
        if column.primary_key || column.not_null {
            return Err(Error::InvalidInput(format!(
                "Cannot add constrained column {}.{} via ALTER TABLE",
                table, column.name
            )));
        }

        let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column.name, column.sql_type);

        info!("Adding column: {}.{} ({})", table, column.name, column.sql_type);

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                info!("Column {}.{} already present", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
