//! Run orchestration.
//!
//! Sequences extract -> transform -> load. A failing stage logs its error
//! with context and stops the run; later stages never start.

use crate::core::extract::{self, SourceTable};
use crate::core::loader::{LoadReport, LoadStrategy, Loader, LoaderConfig};
use crate::core::store::OrderStore;
use crate::core::transform;
use crate::models::config::{Config, StoreConfig};
use crate::models::record::Record;
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Per-run options that are not part of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Roll back the load instead of committing it.
    pub dry_run: bool,
    /// Draw a progress bar during the load.
    pub show_progress: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: PathBuf,
    pub database: PathBuf,
    pub table: String,
    pub strategy: LoadStrategy,
    pub rows_read: usize,
    pub inserted: u64,
    pub skipped: u64,
    pub dry_run: bool,
    pub elapsed_ms: u64,
}

/// Run the full pipeline.
pub fn run(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    let started = Instant::now();
    tracing::info!("Starting ETL process for {}", config.source.path.display());

    let table = extract_stage(config)?;
    let records = transform_stage(&table)?;
    let report = load_stage(config, options, &records)?;

    let summary = RunSummary {
        source: config.source.path.clone(),
        database: config.store.path.clone(),
        table: config.store.table.clone(),
        strategy: config.load.strategy,
        rows_read: table.len(),
        inserted: report.inserted,
        skipped: report.skipped,
        dry_run: options.dry_run,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    tracing::info!("ETL process completed successfully");
    Ok(summary)
}

fn extract_stage(config: &Config) -> Result<SourceTable> {
    match extract::read_source(&config.source.path, &config.source) {
        Ok(table) => {
            tracing::info!("Data extracted successfully. Rows read: {}", table.len());
            Ok(table)
        }
        Err(e) => {
            tracing::error!("Error during data extraction: {}", e);
            Err(e)
        }
    }
}

fn transform_stage(table: &SourceTable) -> Result<Vec<Record>> {
    match transform::transform(table) {
        Ok(records) => {
            tracing::info!("Data transformed successfully. Columns cleaned and dates formatted.");
            Ok(records)
        }
        Err(e) => {
            tracing::error!("Error during data transformation: {}", e);
            Err(e)
        }
    }
}

fn load_stage(config: &Config, options: &RunOptions, records: &[Record]) -> Result<LoadReport> {
    match load_records(config, options, records) {
        Ok(report) => {
            tracing::info!(
                "Load completed. Inserted: {}, Skipped: {}",
                report.inserted,
                report.skipped
            );
            Ok(report)
        }
        Err(e) => {
            tracing::error!("Error during data loading: {}", e);
            Err(e)
        }
    }
}

/// Open the store, load and release the connection.
fn load_records(config: &Config, options: &RunOptions, records: &[Record]) -> Result<LoadReport> {
    let mut store = OrderStore::open(&config.store)?;
    prepare_table(&store, &config.store)?;

    let loader = Loader::with_config(LoaderConfig {
        strategy: config.load.strategy,
        dry_run: options.dry_run,
        show_progress: options.show_progress,
    });
    let report = loader.load(&mut store, records)?;

    // The batch is already committed; a failed close does not undo it.
    if let Err(e) = store.close() {
        tracing::warn!("{}", e);
    }

    Ok(report)
}

/// Create the table when allowed, otherwise require it to exist.
pub fn prepare_table(store: &OrderStore, config: &StoreConfig) -> Result<()> {
    if config.create_table {
        return store.ensure_table();
    }
    if store.table_exists()? {
        Ok(())
    } else {
        Err(Error::Query(format!(
            "table '{}' does not exist",
            store.table()
        )))
    }
}
