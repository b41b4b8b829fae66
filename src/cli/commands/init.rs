//! Init command implementation.

use crate::core::store::OrderStore;
use crate::models::config::StoreConfig;
use crate::Result;
use colored::Colorize;

/// Create the destination table, and optionally its identity index.
pub fn init(config: &StoreConfig, unique: bool) -> Result<()> {
    let store = OrderStore::open(config)?;
    store.ensure_table()?;
    tracing::info!("Table {} ready in {}", config.table, config.path.display());

    if unique {
        store.ensure_identity_index()?;
        tracing::info!("Identity index ready on {}", config.table);
    }

    store.close()?;

    println!(
        "{} {} ({})",
        "[OK] Table ready:".bold().green(),
        config.table,
        config.path.display()
    );
    if unique {
        println!("  {} (order_id, product_id)", "Unique index:".bold());
    }

    Ok(())
}
