//! Recipe record sources
//!
//! Two inputs feed the tagger:
//! - **Database**: `title` and `ingredients` read from the `recipes` table
//!   itself. Each record carries its own `id`, so no positional assumption is
//!   needed.
//! - **JSON Lines**: one object per line, as exported by the ingestion stage.
//!   Records have no id and are paired with stored rows by position (see
//!   [`crate::orchestrator::correlate_by_position`]).
//!
//! A record that cannot be decoded is kept in the stream as an error so that
//! positions stay aligned and the run can count it.

use crate::error::{Result, TaggerError};
use recipe_common::db::StoredRecipe;
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use thiserror::Error;

/// One raw recipe as produced upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecipeRecord {
    #[serde(default, alias = "Title")]
    pub title: Option<String>,
    #[serde(default, alias = "Ingredients")]
    pub ingredients: Option<String>,
}

impl RecipeRecord {
    pub fn new(title: Option<&str>, ingredients: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            ingredients: ingredients.map(str::to_string),
        }
    }

    /// Both fields absent or whitespace only
    pub fn is_blank(&self) -> bool {
        let blank = |field: &Option<String>| field.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.title) && blank(&self.ingredients)
    }
}

/// A record that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("recipe {id}: {message}")]
    Undecodable { id: i64, message: String },
}

/// Decoded record or the reason it could not be read
pub type SourceRecord = std::result::Result<RecipeRecord, RecordError>;

/// Stored row paired with its input record
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedRecord {
    pub stored: StoredRecipe,
    pub record: SourceRecord,
}

/// Read records from the recipes table, keyed by id
pub async fn load_database_records(pool: &SqlitePool) -> Result<Vec<CorrelatedRecord>> {
    let rows = sqlx::query("SELECT id, tags, title, ingredients FROM recipes ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(decode_row).collect()
}

/// Decode one row; only a missing id is fatal
fn decode_row(row: &SqliteRow) -> Result<CorrelatedRecord> {
    let id: i64 = row.try_get("id")?;

    let fields = (|| -> std::result::Result<(Option<String>, RecipeRecord), sqlx::Error> {
        let tags = row.try_get("tags")?;
        let record = RecipeRecord {
            title: row.try_get("title")?,
            ingredients: row.try_get("ingredients")?,
        };
        Ok((tags, record))
    })();

    Ok(match fields {
        Ok((tags, record)) => CorrelatedRecord {
            stored: StoredRecipe { id, tags },
            record: Ok(record),
        },
        Err(e) => CorrelatedRecord {
            stored: StoredRecipe { id, tags: None },
            record: Err(RecordError::Undecodable {
                id,
                message: e.to_string(),
            }),
        },
    })
}

/// Read a JSON Lines file
///
/// Blank lines are ignored. Lines that are not valid UTF-8 or not a JSON
/// object with optional string `title`/`ingredients` fields become
/// [`RecordError::Malformed`] entries. Failing to read the file is fatal.
pub fn load_json_lines(path: &Path) -> Result<Vec<SourceRecord>> {
    let bytes = std::fs::read(path).map_err(|source| TaggerError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_json_lines(&bytes))
}

/// Parse JSON Lines content
pub fn parse_json_lines(bytes: &[u8]) -> Vec<SourceRecord> {
    bytes
        .split(|b| *b == b'\n')
        .enumerate()
        .filter_map(|(index, raw)| {
            let line = index + 1;
            let text = match std::str::from_utf8(raw) {
                Ok(text) => text.trim(),
                Err(e) => {
                    return Some(Err(RecordError::Malformed {
                        line,
                        message: e.to_string(),
                    }))
                }
            };

            if text.is_empty() {
                return None;
            }

            Some(
                serde_json::from_str::<RecipeRecord>(text).map_err(|e| RecordError::Malformed {
                    line,
                    message: e.to_string(),
                }),
            )
        })
        .collect()
}
