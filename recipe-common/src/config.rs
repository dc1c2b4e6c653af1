//! Configuration loading and database path resolution
//!
//! Two-tier bootstrap configuration:
//! 1. **TOML file**: database path, tagging policy, logging
//! 2. **Overrides**: environment variables and command-line arguments
//!
//! # Resolution order
//!
//! Config file:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `<APP>_CONFIG`
//! 3. `./<app>.toml` in the working directory
//! 4. `<config dir>/<app>/config.toml` (platform config directory)
//!
//! Database path:
//! 1. Command-line argument
//! 2. Environment variable `<APP>_DATABASE`
//! 3. `database_path` from the TOML file
//! 4. Compiled default [`DEFAULT_DATABASE_PATH`]

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Compiled default database location, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "assets/db/recipes.db";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; missing fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    pub database_path: Option<PathBuf>,

    /// Tagging policy
    pub tagging: TaggingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Tagging policy settings
///
/// `max_tags` and `threshold_ratio` are product policy, not algorithmic
/// constants, so they live here rather than in the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Pending updates per committed transaction
    pub batch_size: usize,
    /// Maximum number of tags assigned to one recipe
    pub max_tags: usize,
    /// Minimum fraction of the top score a category needs to be selected
    pub threshold_ratio: f64,
    /// Normalized texts shorter than this (in characters) are skipped
    pub min_text_chars: usize,
    /// Extra attempts for a failed batch flush before the run aborts
    pub flush_retries: u32,
    /// Leave rows that already carry tags untouched
    pub only_untagged: bool,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_tags: 4,
            threshold_ratio: 0.5,
            min_text_chars: 3,
            flush_retries: 3,
            only_untagged: false,
        }
    }
}

impl TaggingConfig {
    /// Reject settings the tagging engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.max_tags == 0 {
            return Err(Error::Config("max_tags must be at least 1".to_string()));
        }
        if !(self.threshold_ratio > 0.0 && self.threshold_ratio <= 1.0) {
            return Err(Error::Config(format!(
                "threshold_ratio must be in (0, 1], got {}",
                self.threshold_ratio
            )));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolves the config file and database path for one tool
///
/// The tool name drives the environment variable prefix and the file names:
/// `recipe-tagger` reads `RECIPE_TAGGER_CONFIG`, `RECIPE_TAGGER_DATABASE`,
/// `./recipe-tagger.toml` and `<config dir>/recipe-tagger/config.toml`.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    app_name: String,
}

impl ConfigResolver {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Environment variable naming the config file
    pub fn config_env_var(&self) -> String {
        format!("{}_CONFIG", self.env_prefix())
    }

    /// Environment variable naming the database file
    pub fn database_env_var(&self) -> String {
        format!("{}_DATABASE", self.env_prefix())
    }

    fn env_prefix(&self) -> String {
        self.app_name.to_uppercase().replace('-', "_")
    }

    /// Locate the config file
    ///
    /// An explicitly named file (argument or environment) must exist. Without
    /// one, the first existing default location is used; `None` means the
    /// built-in defaults apply.
    pub fn config_path(&self, cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
        let explicit = cli_arg
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(self.config_env_var()).map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::NotFound(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        Ok(self.default_config_locations().into_iter().find(|p| p.exists()))
    }

    /// Load the bootstrap configuration, or defaults when no file is found
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        match self.config_path(cli_arg)? {
            Some(path) => load_toml_config(&path),
            None => Ok(TomlConfig::default()),
        }
    }

    /// Candidate config files when none is named explicitly
    fn default_config_locations(&self) -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(format!("{}.toml", self.app_name))];
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join(&self.app_name).join("config.toml"));
        }
        locations
    }

    /// Database path following the documented priority order
    pub fn database_path(&self, cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Some(path) = std::env::var_os(self.database_env_var()) {
            return PathBuf::from(path);
        }

        if let Some(path) = &config.database_path {
            return path.clone();
        }

        PathBuf::from(DEFAULT_DATABASE_PATH)
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}
