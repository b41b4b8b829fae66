//! Superstore ETL CLI
//!
//! Loads Superstore order CSV files into SQLite, inserting each
//! (order, product) pair at most once across runs.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use superstore_etl::cli::{
    args::{Cli, Commands},
    commands::{
        init,
        run::{self, RunArgs},
        stats,
    },
};
use superstore_etl::models::config::{self, Config};

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "[FAIL]".red(), e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    if let Err(e) = init_logging(cli.verbose, log_file.as_deref()) {
        eprintln!("{} {:#}", "[FAIL]".red(), e);
        return ExitCode::FAILURE;
    }

    // Run the appropriate command
    let loading = matches!(cli.command, Commands::Run { .. });
    match dispatch(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("ETL process failed: {:#}", e);
            eprintln!();
            eprintln!("{} {:#}", "[FAIL] ETL process failed:".bold().red(), e);
            let hint = e
                .downcast_ref::<superstore_etl::Error>()
                .and_then(|err| failure_hint(err, loading));
            if let Some(hint) = hint {
                eprintln!("  {} {}", "->".yellow(), hint);
            }
            if log_file.is_some() {
                eprintln!("Check logs for details.");
            }
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            source,
            store,
            strategy,
            encoding,
            dry_run,
            format,
        } => {
            store.apply(&mut config.store);
            let args = RunArgs {
                source,
                strategy,
                encoding,
                dry_run,
                json: is_json(&format)?,
                skip_preflight: cli.skip_preflight,
            };
            run::run(config, &args)?;
        }

        Commands::Init { store, unique } => {
            store.apply(&mut config.store);
            init::init(&config.store, unique)?;
        }

        Commands::Stats { store, format } => {
            store.apply(&mut config.store);
            stats::stats(&config.store, is_json(&format)?)?;
        }
    }

    Ok(())
}

/// Hint printed under a failure. The rollback note only applies to `run`.
fn failure_hint(err: &superstore_etl::Error, loading: bool) -> Option<&'static str> {
    if err.is_source_error() {
        Some("Check the source file path, encoding and column headers")
    } else if err.is_store_error() && !loading {
        Some("Check the database path and the table name")
    } else if err.is_store_error() {
        Some("No rows from this run were committed; fix the store and run again")
    } else {
        None
    }
}

fn is_json(format: &str) -> anyhow::Result<bool> {
    match format {
        "json" => Ok(true),
        "text" => Ok(false),
        other => anyhow::bail!("Unknown output format '{}' (expected text or json)", other),
    }
}

/// Initialize the logging system.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    use std::sync::Mutex;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("superstore_etl=debug")
    } else {
        EnvFilter::new("superstore_etl=info")
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .with(filter)
        .init();

    Ok(())
}
