//! Run command implementation.
//!
//! Runs preflight checks, then the full extract/transform/load pipeline,
//! and prints the inserted/skipped counts.

use crate::core::loader::LoadStrategy;
use crate::core::pipeline::{self, RunOptions, RunSummary};
use crate::models::config::Config;
use crate::preflight::{self, CheckResult};
use crate::{Error, Result};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

/// Options of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub source: Option<PathBuf>,
    pub strategy: Option<String>,
    pub encoding: Option<String>,
    pub dry_run: bool,
    pub json: bool,
    pub skip_preflight: bool,
}

/// Apply command line overrides to the configuration.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(ref source) = args.source {
        config.source.path = source.clone();
    }
    if let Some(ref encoding) = args.encoding {
        config.source.encoding = encoding.clone();
    }
    if let Some(ref strategy) = args.strategy {
        config.load.strategy = strategy.parse::<LoadStrategy>()?;
    }
    Ok(())
}

/// Run the pipeline.
pub fn run(mut config: Config, args: &RunArgs) -> Result<RunSummary> {
    apply_overrides(&mut config, args)?;

    if !args.json {
        println!("{}", "[ETL] Starting ETL process...".bold().cyan());
        println!();
    }

    if !args.skip_preflight {
        let results = preflight::run_preflight_checks(&config);
        report_preflight(
            &results,
            args.json,
            &mut std::io::stdout(),
            &mut std::io::stderr(),
        )?;
        if !preflight::all_passed(&results) {
            return Err(Error::other(
                "Preflight checks failed. Fix the issues above and try again.",
            ));
        }
    }

    let options = RunOptions {
        dry_run: args.dry_run,
        show_progress: !args.json,
    };
    let summary = pipeline::run(&config, &options)?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::other(format!("failed to serialize summary: {}", e)))?;
        println!("{}", json);
    } else {
        print_summary(&summary);
    }

    Ok(summary)
}

/// Print preflight results. JSON runs keep stdout for the summary, so
/// results go to `err` there, and only when a check failed.
fn report_preflight<O: Write, E: Write>(
    results: &[CheckResult],
    json: bool,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    if !json {
        preflight::print_results(results, out)?;
        writeln!(out)?;
    } else if !preflight::all_passed(results) {
        preflight::print_results(results, err)?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("  {} {}", "Source:".bold(), summary.source.display());
    println!(
        "  {} {} ({})",
        "Store:".bold(),
        summary.database.display(),
        summary.table
    );
    println!("  {} {}", "Strategy:".bold(), summary.strategy);
    println!("  {} {}", "Rows read:".bold(), summary.rows_read);
    println!();
    println!(
        "{} Inserted: {} | Skipped (duplicates): {}",
        "[OK] Load completed!".bold().green(),
        summary.inserted,
        summary.skipped
    );

    if summary.dry_run {
        println!(
            "{}",
            "[DRY RUN] No changes were committed.".bold().yellow()
        );
    }

    println!(
        "{} ({} ms)",
        "[OK] ETL completed successfully!".bold().green(),
        summary.elapsed_ms
    );
}
