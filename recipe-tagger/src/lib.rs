//! recipe-tagger library interface
//!
//! Deterministic keyword tagging for stored recipes. The pipeline, in order:
//! - [`source`] reads raw records (from the database itself or a JSON Lines
//!   export) and [`orchestrator`] pairs them with stored rows
//! - [`normalize`] reduces title and ingredients to a canonical text
//! - [`classifier`] scores the text against the [`rules`] table and selects
//!   tags
//! - [`persister`] batches the resulting writes into a [`store`]
//!
//! [`tag_recipes`] runs the whole pipeline over an open pool; the binary adds
//! configuration, logging setup and the post-run [`report`].

pub mod classifier;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod persister;
pub mod report;
pub mod retry;
pub mod rules;
pub mod source;
pub mod store;

pub use crate::error::{Result, TaggerError};
pub use crate::orchestrator::RunStatistics;

use crate::classifier::{Classifier, SelectionPolicy};
use crate::orchestrator::{correlate_by_position, Correlation, TaggingRun};
use crate::rules::RuleTable;
use crate::store::SqliteTagStore;
use recipe_common::config::TaggingConfig;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;

/// Where raw recipe records come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// `title`/`ingredients` columns of the recipes table, keyed by id
    Database,
    /// JSON Lines export, paired with stored rows by position
    JsonLines(PathBuf),
}

/// Tag every recipe from `input` and commit the results to `pool`
pub async fn tag_recipes(
    pool: &SqlitePool,
    input: &InputSource,
    config: &TaggingConfig,
) -> Result<RunStatistics> {
    config.validate()?;

    let store = SqliteTagStore::new(pool.clone());

    let correlation = match input {
        InputSource::Database => Correlation::keyed(source::load_database_records(pool).await?),
        InputSource::JsonLines(path) => {
            let records = source::load_json_lines(path)?;
            info!("Loaded {} records from {}", records.len(), path.display());

            let stored = store.fetch_stored_recipes().await?;
            correlate_by_position(stored, records)
        }
    };

    let classifier = Classifier::new(RuleTable::standard(), SelectionPolicy::from(config));

    TaggingRun::from_config(classifier, store, config)
        .run(correlation)
        .await
}
