//! Shared helper functions for CLI commands

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use tracing::debug;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Database, ReviewStore, SqlEmployeeDirectory};

/// An opened store plus the output format every command should use
pub struct Session {
    pub store: ReviewStore,
    pub format: OutputFormat,
}

impl Session {
    /// Open the configured database with employee validation against its
    /// `employees` table
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = Config::load();
        let path = global.db.clone().unwrap_or_else(|| config.database_path());
        debug!(path = %path.display(), "opening database");

        let db = Database::open(&path).into_diagnostic()?;
        let directory = SqlEmployeeDirectory::new(db.clone());

        Ok(Self {
            store: ReviewStore::new(db, directory),
            format: resolve_format(global.format, config.default_format.as_deref()),
        })
    }
}

/// A format given on the command line wins, `auto` included; otherwise the
/// configured default is used if it parses
pub fn resolve_format(requested: Option<OutputFormat>, configured: Option<&str>) -> OutputFormat {
    requested
        .or_else(|| configured.and_then(|s| OutputFormat::from_str(s, true).ok()))
        .unwrap_or_default()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a field for TSV output
///
/// Tabs and line breaks would split the record, so they become `\t`, `\n`
/// and `\r`; backslashes are doubled.
pub fn escape_tsv(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
