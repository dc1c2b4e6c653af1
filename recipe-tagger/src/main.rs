//! recipe-tagger - Rule-based recipe tagging tool
//!
//! Reads recipes from an ingested SQLite database (or a JSON Lines export of
//! the same data), assigns category tags by keyword matching and writes them
//! to `recipes.tags`. Re-running over the same input yields the same tags.

use anyhow::{Context, Result};
use clap::Parser;
use recipe_common::config::{load_toml_config, ConfigResolver, TomlConfig};
use recipe_common::db::open_database;
use recipe_tagger::{report, tag_recipes, InputSource, TaggerError};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const APP_NAME: &str = "recipe-tagger";

/// Command-line arguments for recipe-tagger
#[derive(Parser, Debug)]
#[command(name = "recipe-tagger")]
#[command(about = "Assign category tags to stored recipes by keyword rules")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "RECIPE_TAGGER_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding the recipes table
    #[arg(short, long, env = "RECIPE_TAGGER_DATABASE")]
    database: Option<PathBuf>,

    /// JSON Lines input, paired with stored rows by position
    ///
    /// Without this, title and ingredients are read from the database.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Updates per committed transaction
    #[arg(long)]
    batch_size: Option<usize>,

    /// Maximum tags per recipe
    #[arg(long)]
    max_tags: Option<usize>,

    /// Minimum score relative to the best category, in (0, 1]
    #[arg(long, value_name = "RATIO")]
    threshold: Option<f64>,

    /// Leave recipes that already have tags untouched
    #[arg(long)]
    only_untagged: bool,

    /// Skip the sample and distribution report after the run
    #[arg(long)]
    no_report: bool,

    /// Print final run statistics as JSON on stdout
    #[arg(long)]
    summary_json: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "RECIPE_TAGGER_LOG")]
    log_level: Option<String>,
}

impl Args {
    /// Command-line values take precedence over the config file
    fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(batch_size) = self.batch_size {
            config.tagging.batch_size = batch_size;
        }
        if let Some(max_tags) = self.max_tags {
            config.tagging.max_tags = max_tags;
        }
        if let Some(threshold) = self.threshold {
            config.tagging.threshold_ratio = threshold;
        }
        if self.only_untagged {
            config.tagging.only_untagged = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration is read before logging exists, so problems here surface
    // through the returned error only
    let resolver = ConfigResolver::new(APP_NAME);
    let config_path = resolver
        .config_path(args.config.as_deref())
        .context("Failed to locate configuration")?;
    let mut config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load configuration")?,
        None => TomlConfig::default(),
    };
    args.apply_overrides(&mut config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} [{}] built {} ({})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("RECIPE_TAGGER_GIT_HASH"),
        env!("RECIPE_TAGGER_BUILT_AT"),
        env!("RECIPE_TAGGER_PROFILE")
    );

    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    config
        .tagging
        .validate()
        .context("Invalid tagging configuration")?;

    let db_path = resolver.database_path(args.database.as_deref(), &config);
    info!("Database: {}", db_path.display());

    let pool = open_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let input = match &args.input {
        Some(path) => InputSource::JsonLines(path.clone()),
        None => InputSource::Database,
    };

    let stats = match tag_recipes(&pool, &input, &config.tagging).await {
        Ok(stats) => stats,
        Err(TaggerError::FlushFailed {
            attempts,
            pending,
            statistics,
            source,
        }) => {
            error!(
                attempts,
                pending,
                "Run aborted, storage holds every batch committed before the failure: {}",
                statistics.display_string()
            );
            if args.summary_json {
                println!("{}", serde_json::to_string_pretty(&statistics)?);
            }
            pool.close().await;
            return Err(anyhow::Error::new(source).context("Failed to commit tag batch"));
        }
        Err(e) => {
            pool.close().await;
            return Err(e).context("Tagging run failed");
        }
    };

    info!("Total processed: {}", stats.processed);
    info!("Successfully tagged: {}", stats.tagged);
    if stats.uncorrelated > 0 {
        warn!("{} records or rows had no counterpart and were not processed", stats.uncorrelated);
    }
    if let Some(elapsed) = stats.elapsed_ms() {
        info!("Elapsed: {} ms", elapsed);
    }

    if !args.no_report {
        // The report is informational; a failing query does not fail the run
        if let Err(e) = report::log_report(&pool).await {
            warn!("Could not produce report: {}", e);
        }
    }

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    pool.close().await;
    info!("Database connection closed");

    Ok(())
}
