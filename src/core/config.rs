//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

/// Database file used when nothing else is configured
pub const DEFAULT_DATABASE: &str = "reviews.db";

/// Configuration with layered hierarchy
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database: Option<PathBuf>,

    /// Default output format (auto, json, tsv)
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/reviews/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Some(global) = Self::parse(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 2. Environment variables
        if let Ok(db) = std::env::var("REVIEWS_DB") {
            config.database = Some(PathBuf::from(db));
        }
        if let Ok(format) = std::env::var("REVIEWS_FORMAT") {
            config.default_format = Some(format);
        }

        config
    }

    /// Parse a YAML config document, ignoring malformed input
    pub fn parse(contents: &str) -> Option<Self> {
        serde_yml::from_str(contents).ok()
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "reviews")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Database path, falling back to `reviews.db` in the working directory
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }
}
