//! Post-run report
//!
//! Read-only queries summarizing what a run left in storage: a handful of
//! tagged sample rows and the most frequent tag strings.

use crate::error::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Rows shown by [`log_report`]
pub const REPORT_LIMIT: i64 = 10;

/// Title characters shown per sample row
const SAMPLE_TITLE_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub id: i64,
    pub title: Option<String>,
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFrequency {
    pub tags: String,
    pub count: i64,
}

/// First `limit` tagged recipes by id
pub async fn sample_tagged(pool: &SqlitePool, limit: i64) -> Result<Vec<SampleRow>> {
    let rows: Vec<(i64, Option<String>, String)> = sqlx::query_as(
        "SELECT id, title, tags FROM recipes WHERE tags IS NOT NULL AND tags != '' ORDER BY id ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, title, tags)| SampleRow { id, title, tags })
        .collect())
}

/// Most frequent stored tag strings, ties broken alphabetically
pub async fn tag_distribution(pool: &SqlitePool, limit: i64) -> Result<Vec<TagFrequency>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT tags, COUNT(*) AS count
        FROM recipes
        WHERE tags IS NOT NULL AND tags != ''
        GROUP BY tags
        ORDER BY count DESC, tags ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(tags, count)| TagFrequency { tags, count })
        .collect())
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Log sample rows and the tag distribution
pub async fn log_report(pool: &SqlitePool) -> Result<()> {
    let samples = sample_tagged(pool, REPORT_LIMIT).await?;
    info!("Sample results:");
    for row in &samples {
        info!(
            "  Recipe {}: '{}...' -> {}",
            row.id,
            truncate_chars(row.title.as_deref().unwrap_or("Unknown"), SAMPLE_TITLE_CHARS),
            row.tags
        );
    }

    let distribution = tag_distribution(pool, REPORT_LIMIT).await?;
    info!("Tag distribution:");
    for entry in &distribution {
        info!("  '{}': {} recipes", entry.tags, entry.count);
    }

    Ok(())
}
