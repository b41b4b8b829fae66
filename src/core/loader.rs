//! Incremental loader module.
//!
//! Loads records into the order store so that each `(order_id, product_id)`
//! pair is stored at most once, however many times the same input is run.
//! All inserts of a run share one transaction, committed after the last
//! record; any failure before that leaves the table as it was.

use crate::core::store::OrderStore;
use crate::models::record::Record;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

/// How duplicates are detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadStrategy {
    /// Query for the identity key, insert only if absent.
    #[default]
    CheckThenInsert,
    /// Rely on a unique index and `INSERT OR IGNORE`, classifying each
    /// record by the affected-row count.
    InsertOrIgnore,
}

impl std::fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStrategy::CheckThenInsert => write!(f, "check-then-insert"),
            LoadStrategy::InsertOrIgnore => write!(f, "insert-or-ignore"),
        }
    }
}

impl std::str::FromStr for LoadStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "check-then-insert" | "check" => Ok(LoadStrategy::CheckThenInsert),
            "insert-or-ignore" | "ignore" => Ok(LoadStrategy::InsertOrIgnore),
            other => Err(Error::Config(format!(
                "unknown load strategy '{}' (expected check-then-insert or insert-or-ignore)",
                other
            ))),
        }
    }
}

/// Loader configuration.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Duplicate detection strategy.
    pub strategy: LoadStrategy,
    /// Roll back instead of committing, keeping the counts.
    pub dry_run: bool,
    /// Draw a progress bar while loading.
    pub show_progress: bool,
}

/// Outcome of one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Records written by this run.
    pub inserted: u64,
    /// Records whose identity key was already present.
    pub skipped: u64,
}

impl LoadReport {
    /// Records processed.
    pub fn total(&self) -> u64 {
        self.inserted + self.skipped
    }
}

/// Incremental loader.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a loader with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load `records` into `store` in order, within one transaction.
    pub fn load(&self, store: &mut OrderStore, records: &[Record]) -> Result<LoadReport> {
        tracing::info!(
            "Loading {} records into {} ({})",
            records.len(),
            store.table(),
            self.config.strategy
        );

        let pb = self.progress_bar(records.len());
        let batch = store.begin()?;
        if self.config.strategy == LoadStrategy::InsertOrIgnore {
            batch.ensure_identity_index()?;
        }
        let mut report = LoadReport::default();

        for record in records {
            let inserted = match self.config.strategy {
                LoadStrategy::CheckThenInsert => {
                    if batch.contains(&record.key())? {
                        false
                    } else {
                        batch.insert(record)?;
                        true
                    }
                }
                LoadStrategy::InsertOrIgnore => batch.insert_or_ignore(record)?,
            };

            if inserted {
                report.inserted += 1;
            } else {
                tracing::debug!("Skipping duplicate {}", record.key());
                report.skipped += 1;
            }
            pb.inc(1);
        }

        pb.finish_and_clear();

        if self.config.dry_run {
            batch.rollback()?;
            tracing::info!("Dry run: {} inserts rolled back", report.inserted);
        } else {
            batch.commit()?;
        }

        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    }
}
