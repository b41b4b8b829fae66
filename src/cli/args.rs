//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Superstore ETL - Incrementally load order CSV files into SQLite
#[derive(Parser, Debug)]
#[command(name = "superstore-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: <config dir>/superstore_etl/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Append log entries to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting the destination store.
#[derive(clap::Args, Debug, Default)]
pub struct StoreArgs {
    /// SQLite database file
    #[arg(short, long, value_name = "DATABASE")]
    pub database: Option<PathBuf>,

    /// Destination table
    #[arg(short, long, value_name = "TABLE")]
    pub table: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract, transform and load a CSV file
    Run {
        /// Source CSV file
        #[arg(value_name = "SOURCE")]
        source: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Duplicate detection: check-then-insert or insert-or-ignore
        #[arg(long)]
        strategy: Option<String>,

        /// Source file encoding (e.g., latin1, utf-8)
        #[arg(long)]
        encoding: Option<String>,

        /// Dry run - load and report, then roll back
        #[arg(long)]
        dry_run: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create the destination table
    Init {
        #[command(flatten)]
        store: StoreArgs,

        /// Also create a unique index on (order_id, product_id)
        #[arg(long)]
        unique: bool,
    },

    /// Show destination table statistics
    Stats {
        #[command(flatten)]
        store: StoreArgs,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl StoreArgs {
    /// Apply command line overrides to the store configuration.
    pub fn apply(&self, config: &mut crate::models::config::StoreConfig) {
        if let Some(ref database) = self.database {
            config.path = database.clone();
        }
        if let Some(ref table) = self.table {
            config.table = table.clone();
        }
    }
}
