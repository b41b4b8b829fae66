//! Integration tests for the incremental loader.
//!
//! Tests cover:
//! - Duplicate detection within a run and across runs
//! - Count conservation and idempotent re-runs
//! - Atomicity when an insert fails mid-run
//! - Conflict-ignoring strategy and dry runs

use chrono::NaiveDate;
use std::path::Path;
use superstore_etl::core::loader::{LoadReport, LoadStrategy, Loader, LoaderConfig};
use superstore_etl::core::store::OrderStore;
use superstore_etl::models::config::StoreConfig;
use superstore_etl::models::record::{IdentityKey, Record};
use superstore_etl::Error;
use tempfile::TempDir;

// ========== TEST FIXTURES ==========

fn record(order_id: &str, product_id: &str) -> Record {
    Record {
        order_id: order_id.to_string(),
        product_id: product_id.to_string(),
        order_date: NaiveDate::from_ymd_opt(2016, 11, 8).unwrap(),
        ship_date: NaiveDate::from_ymd_opt(2016, 11, 11).unwrap(),
        customer_name: "Claire Gute".to_string(),
        category: "Furniture".to_string(),
        segment: "Consumer".to_string(),
        sales: 261.96,
        quantity: 2,
        profit: 41.9136,
    }
}

fn store_config(dir: &Path) -> StoreConfig {
    StoreConfig {
        path: dir.join("etl_superstore.db"),
        ..StoreConfig::default()
    }
}

/// Open the store for one run, as the pipeline does.
fn open(config: &StoreConfig) -> OrderStore {
    let store = OrderStore::open(config).unwrap();
    store.ensure_table().unwrap();
    store
}

fn load(config: &StoreConfig, records: &[Record], strategy: LoadStrategy) -> LoadReport {
    let mut store = open(config);
    let loader = Loader::with_config(LoaderConfig {
        strategy,
        ..LoaderConfig::default()
    });
    loader.load(&mut store, records).unwrap()
}

fn row_count(config: &StoreConfig) -> u64 {
    open(config).row_count().unwrap()
}

fn scenario_records() -> Vec<Record> {
    vec![record("A", "1"), record("A", "2"), record("A", "1")]
}

// ========== SCENARIO TESTS ==========

#[test]
fn test_duplicate_in_first_run_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let report = load(&config, &scenario_records(), LoadStrategy::CheckThenInsert);

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(row_count(&config), 2);
}

#[test]
fn test_rerun_against_populated_table() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    load(&config, &scenario_records(), LoadStrategy::CheckThenInsert);
    let second = load(&config, &scenario_records(), LoadStrategy::CheckThenInsert);

    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(row_count(&config), 2);
}

#[test]
fn test_incremental_run_inserts_only_new_keys() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    load(&config, &[record("A", "1"), record("B", "1")], LoadStrategy::CheckThenInsert);
    let report = load(
        &config,
        &[record("B", "1"), record("C", "1"), record("A", "1"), record("C", "2")],
        LoadStrategy::CheckThenInsert,
    );

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(row_count(&config), 4);
}

// ========== INVARIANT TESTS ==========

#[test]
fn test_idempotent_second_run() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let records: Vec<Record> = (0..50)
        .map(|i| record(&format!("CA-2016-{:06}", i / 3), &format!("P-{}", i % 3)))
        .collect();

    let first = load(&config, &records, LoadStrategy::CheckThenInsert);
    let second = load(&config, &records, LoadStrategy::CheckThenInsert);

    assert_eq!(first.inserted, 50);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 50);
}

#[test]
fn test_identity_ignores_other_attributes() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let mut changed = record("A", "1");
    changed.customer_name = "Someone Else".to_string();
    changed.sales = 1.0;
    changed.quantity = 99;

    let report = load(
        &config,
        &[record("A", "1"), changed],
        LoadStrategy::CheckThenInsert,
    );
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 1);

    // First occurrence wins.
    let stored = open(&config)
        .get(&IdentityKey::new("A", "1"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.customer_name, "Claire Gute");
    assert_eq!(stored.quantity, 2);
}

#[test]
fn test_count_conservation() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let records = vec![
        record("A", "1"),
        record("A", "1"),
        record("B", "2"),
        record("A", "1"),
        record("B", "3"),
    ];
    let report = load(&config, &records, LoadStrategy::CheckThenInsert);

    assert_eq!(report.total(), records.len() as u64);
    assert_eq!(report.inserted, 3);
}

#[test]
fn test_keys_are_not_confused_across_columns() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let report = load(
        &config,
        &[record("A", "B"), record("B", "A")],
        LoadStrategy::CheckThenInsert,
    );
    assert_eq!(report.inserted, 2);
}

// ========== ATOMICITY TESTS ==========

/// Make the store reject inserts for one order id.
fn reject_order(config: &StoreConfig, order_id: &str) {
    let conn = rusqlite::Connection::open(&config.path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TRIGGER reject_bad BEFORE INSERT ON {table}
         WHEN NEW.order_id = '{order_id}'
         BEGIN SELECT RAISE(ABORT, 'rejected by test'); END;",
        table = config.table,
        order_id = order_id
    ))
    .unwrap();
}

#[test]
fn test_failed_insert_leaves_no_rows_from_run() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    // Prior committed run.
    load(&config, &[record("OLD", "1")], LoadStrategy::CheckThenInsert);
    reject_order(&config, "BAD");

    let mut store = open(&config);
    let result = Loader::new().load(
        &mut store,
        &[record("A", "1"), record("A", "2"), record("BAD", "1"), record("C", "1")],
    );
    drop(store);

    assert!(matches!(result, Err(Error::Query(_))));
    assert_eq!(row_count(&config), 1);
    assert!(open(&config)
        .get(&IdentityKey::new("OLD", "1"))
        .unwrap()
        .is_some());
}

#[test]
fn test_failed_insert_or_ignore_is_atomic() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());
    open(&config);
    reject_order(&config, "BAD");

    let mut store = open(&config);
    let loader = Loader::with_config(LoaderConfig {
        strategy: LoadStrategy::InsertOrIgnore,
        ..LoaderConfig::default()
    });
    let result = loader.load(&mut store, &[record("A", "1"), record("BAD", "1")]);
    drop(store);

    assert!(result.is_err());
    assert_eq!(row_count(&config), 0);
}

#[test]
fn test_unreachable_store_is_connection_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig {
        create_if_missing: false,
        ..store_config(temp_dir.path())
    };

    let result = OrderStore::open(&config);
    assert!(matches!(result, Err(Error::Connection(_))));
    assert!(!config.path.exists());
}

// ========== STRATEGY TESTS ==========

#[test]
fn test_insert_or_ignore_matches_check_then_insert() {
    let temp_dir = TempDir::new().unwrap();
    let checked = store_config(&temp_dir.path().join("checked"));
    let ignored = store_config(&temp_dir.path().join("ignored"));

    let first_checked = load(&checked, &scenario_records(), LoadStrategy::CheckThenInsert);
    let first_ignored = load(&ignored, &scenario_records(), LoadStrategy::InsertOrIgnore);
    assert_eq!(first_checked, first_ignored);

    let second_checked = load(&checked, &scenario_records(), LoadStrategy::CheckThenInsert);
    let second_ignored = load(&ignored, &scenario_records(), LoadStrategy::InsertOrIgnore);
    assert_eq!(second_checked, second_ignored);
    assert_eq!(second_ignored.skipped, 3);
}

#[test]
fn test_insert_or_ignore_fails_on_existing_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    // Rows written without any existence check.
    {
        let mut store = open(&config);
        let batch = store.begin().unwrap();
        batch.insert(&record("A", "1")).unwrap();
        batch.insert(&record("A", "1")).unwrap();
        batch.commit().unwrap();
    }

    let mut store = open(&config);
    let loader = Loader::with_config(LoaderConfig {
        strategy: LoadStrategy::InsertOrIgnore,
        ..LoaderConfig::default()
    });
    let result = loader.load(&mut store, &[record("B", "1")]);
    assert!(matches!(result, Err(Error::Query(_))));
}

#[test]
fn test_dry_run_reports_without_committing() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let mut store = open(&config);
    let loader = Loader::with_config(LoaderConfig {
        dry_run: true,
        ..LoaderConfig::default()
    });
    let report = loader.load(&mut store, &scenario_records()).unwrap();
    drop(store);

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(row_count(&config), 0);
}

fn index_count(config: &StoreConfig) -> i64 {
    let conn = rusqlite::Connection::open(&config.path).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index'",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn test_insert_or_ignore_dry_run_leaves_schema_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    let mut store = open(&config);
    let loader = Loader::with_config(LoaderConfig {
        strategy: LoadStrategy::InsertOrIgnore,
        dry_run: true,
        ..LoaderConfig::default()
    });
    let report = loader.load(&mut store, &[record("A", "1")]).unwrap();
    drop(store);

    assert_eq!(report.inserted, 1);
    assert_eq!(row_count(&config), 0);
    assert_eq!(index_count(&config), 0);
}

#[test]
fn test_failed_insert_or_ignore_removes_identity_index() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());
    open(&config);
    reject_order(&config, "BAD");

    let mut store = open(&config);
    let loader = Loader::with_config(LoaderConfig {
        strategy: LoadStrategy::InsertOrIgnore,
        ..LoaderConfig::default()
    });
    let result = loader.load(&mut store, &[record("BAD", "1")]);
    drop(store);

    assert!(result.is_err());
    assert_eq!(index_count(&config), 0);
}

#[test]
fn test_committed_insert_or_ignore_keeps_identity_index() {
    let temp_dir = TempDir::new().unwrap();
    let config = store_config(temp_dir.path());

    load(&config, &[record("A", "1")], LoadStrategy::InsertOrIgnore);
    assert_eq!(index_count(&config), 1);
}
