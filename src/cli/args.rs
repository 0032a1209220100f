//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    review::{DeleteArgs, EditArgs, ListArgs, NewArgs, ShowArgs},
};

#[derive(Parser)]
#[command(name = "reviews")]
#[command(author, version, about = "Performance review records")]
#[command(long_about = "Create, inspect, edit and delete performance reviews stored in a SQLite database.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format (default: from config, then auto)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// SQLite database file (default: from config, then ./reviews.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the reviews table
    Init,

    /// Drop the reviews table
    Drop,

    /// Create and save a new review
    New(NewArgs),

    /// Show one review
    Show(ShowArgs),

    /// List reviews
    List(ListArgs),

    /// Change fields of a saved review
    Edit(EditArgs),

    /// Delete a review
    Delete(DeleteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (table for lists)
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
}
