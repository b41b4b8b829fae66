//! Store preflight check.
//!
//! Never creates the database: a missing file is only reported, and the
//! load stage creates it later if allowed.

use super::CheckResult;
use crate::core::store::OrderStore;
use crate::models::config::StoreConfig;

const NAME: &str = "Store";

/// Check that the database can be opened and the table is usable.
pub fn check(config: &StoreConfig) -> CheckResult {
    if !config.path.exists() {
        return if config.create_if_missing {
            CheckResult::ok(
                NAME,
                format!("{} will be created", config.path.display()),
            )
        } else {
            CheckResult::fail(NAME, format!("{} does not exist", config.path.display()))
                .with_hint("Enable [store] create_if_missing or point --database at an existing file")
        };
    }

    let existing = StoreConfig {
        create_if_missing: false,
        ..config.clone()
    };
    let store = match OrderStore::open(&existing) {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::fail(NAME, e.to_string())
                .with_hint("Check the database path and its permissions")
        }
    };

    match store.table_exists() {
        Ok(true) => CheckResult::ok(NAME, format!("table {} found", config.table)),
        Ok(false) if config.create_table => {
            CheckResult::ok(NAME, format!("table {} will be created", config.table))
        }
        Ok(false) => CheckResult::fail(NAME, format!("table {} does not exist", config.table))
            .with_hint("Run `superstore-etl init` or enable [store] create_table"),
        Err(e) => CheckResult::fail(NAME, e.to_string()).with_hint("Check the database file"),
    }
}
