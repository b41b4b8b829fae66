//! Stats command implementation.

use crate::core::store::{OrderStore, TableStats};
use crate::models::config::StoreConfig;
use crate::{Error, Result};
use colored::Colorize;

/// Print statistics of the destination table.
pub fn stats(config: &StoreConfig, json: bool) -> Result<TableStats> {
    let store = OrderStore::open(config)?;
    if !store.table_exists()? {
        return Err(Error::Query(format!(
            "table '{}' does not exist",
            config.table
        )));
    }
    let stats = store.stats()?;

    if json {
        let out = serde_json::to_string_pretty(&stats)
            .map_err(|e| Error::other(format!("failed to serialize stats: {}", e)))?;
        println!("{}", out);
        return Ok(stats);
    }

    println!("{} {}", "[STATS]".bold().cyan(), config.table.bold());
    println!();
    println!("  {:<16} {}", "Rows:".bold(), stats.rows);
    println!("  {:<16} {}", "Distinct keys:".bold(), stats.distinct_keys);
    println!(
        "  {:<16} {} .. {}",
        "Order dates:".bold(),
        stats.first_order_date.as_deref().unwrap_or("-"),
        stats.last_order_date.as_deref().unwrap_or("-")
    );

    if stats.rows != stats.distinct_keys {
        println!();
        println!(
            "{} {} rows share an identity key with another row",
            "[WARNING]".bold().yellow(),
            stats.rows - stats.distinct_keys
        );
    }

    Ok(stats)
}
