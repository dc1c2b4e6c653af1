//! # Recipe Common Library
//!
//! Shared code for the recipe tooling including:
//! - Database connection setup and `recipes` schema checks
//! - Shared recipe models
//! - Configuration loading (TOML bootstrap, environment, command line)
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
