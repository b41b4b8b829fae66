//! SQLite order store.
//!
//! Owns the single connection used by a run. All statements are
//! parameterized; the only identifier spliced into SQL is the table name,
//! which is validated on open.

use crate::core::transform::{format_date, STORE_DATE_FORMAT};
use crate::models::config::StoreConfig;
use crate::models::record::{IdentityKey, Record};
use crate::{Error, Result};
use chrono::NaiveDate;
use rusqlite::{
    named_params, params, Connection, OpenFlags, OptionalExtension, Transaction,
    TransactionBehavior,
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Prepared SQL text for one table.
#[derive(Debug, Clone)]
struct Statements {
    exists: String,
    insert: String,
    insert_or_ignore: String,
    select: String,
    identity_index: String,
}

const COLUMNS: &str = "order_id, product_id, order_date, ship_date, customer_name, \
                       category, segment, sales, quantity, profit";

const NAMED_VALUES: &str = ":order_id, :product_id, :order_date, :ship_date, :customer_name, \
                            :category, :segment, :sales, :quantity, :profit";

impl Statements {
    fn for_table(table: &str) -> Self {
        Self {
            exists: format!(
                "SELECT 1 FROM {} WHERE order_id = ?1 AND product_id = ?2 LIMIT 1",
                table
            ),
            insert: format!("INSERT INTO {} ({}) VALUES ({})", table, COLUMNS, NAMED_VALUES),
            insert_or_ignore: format!(
                "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
                table, COLUMNS, NAMED_VALUES
            ),
            select: format!(
                "SELECT {} FROM {} WHERE order_id = ?1 AND product_id = ?2 LIMIT 1",
                COLUMNS, table
            ),
            identity_index: format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS ux_{0}_identity ON {0} (order_id, product_id);",
                table
            ),
        }
    }
}

/// Summary of the stored table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableStats {
    pub rows: u64,
    pub distinct_keys: u64,
    pub first_order_date: Option<String>,
    pub last_order_date: Option<String>,
}

/// Check that a table name is a plain SQL identifier.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(Error::InvalidTableName(name.to_string()))
    }
}

/// Persistent table of order records.
pub struct OrderStore {
    conn: Connection,
    table: String,
    sql: Statements,
}

impl OrderStore {
    /// Open the store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        validate_table_name(&config.table)?;

        let path = &config.path;
        let connection_error = |e: &dyn std::fmt::Display| {
            Error::Connection(format!("{}: {}", path.display(), e))
        };

        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
            ensure_parent_dir(path).map_err(|e| connection_error(&e))?;
        }

        let conn = Connection::open_with_flags(path, flags).map_err(|e| connection_error(&e))?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| connection_error(&e))?;

        // SQLite opens lazily; touching the schema surfaces unreadable files here.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| connection_error(&e))?;

        tracing::debug!("Opened store {} (table {})", path.display(), config.table);

        Ok(Self::from_connection(conn, &config.table))
    }

    /// Open a private in-memory store.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        validate_table_name(table)?;
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Connection(format!(":memory:: {}", e)))?;
        Ok(Self::from_connection(conn, table))
    }

    fn from_connection(conn: Connection, table: &str) -> Self {
        Self {
            conn,
            table: table.to_string(),
            sql: Statements::for_table(table),
        }
    }

    /// Destination table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the destination table if it does not exist.
    pub fn ensure_table(&self) -> Result<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                order_id      TEXT NOT NULL,
                product_id    TEXT NOT NULL,
                order_date    TEXT NOT NULL,
                ship_date     TEXT NOT NULL,
                customer_name TEXT NOT NULL,
                category      TEXT NOT NULL,
                segment       TEXT NOT NULL,
                sales         REAL NOT NULL,
                quantity      INTEGER NOT NULL,
                profit        REAL NOT NULL
            );",
            self.table
        );
        self.conn
            .execute_batch(&ddl)
            .map_err(|e| Error::query("failed to create table", e))
    }

    /// Create a unique index on the identity key.
    ///
    /// Fails if rows already violate it.
    pub fn ensure_identity_index(&self) -> Result<()> {
        self.conn
            .execute_batch(&self.sql.identity_index)
            .map_err(|e| Error::query("failed to create identity index", e))
    }

    /// Whether the destination table exists.
    pub fn table_exists(&self) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.table],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| Error::query("failed to inspect schema", e))
    }

    /// Number of stored rows.
    pub fn row_count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        self.conn
            .query_row(&sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| Error::query("failed to count rows", e))
    }

    /// Row count, distinct identity keys and order date range.
    pub fn stats(&self) -> Result<TableStats> {
        let sql = format!(
            "SELECT COUNT(*), MIN(order_date), MAX(order_date), \
             (SELECT COUNT(*) FROM (SELECT DISTINCT order_id, product_id FROM {0})) \
             FROM {0}",
            self.table
        );
        self.conn
            .query_row(&sql, [], |row| {
                Ok(TableStats {
                    rows: row.get::<_, i64>(0)? as u64,
                    first_order_date: row.get(1)?,
                    last_order_date: row.get(2)?,
                    distinct_keys: row.get::<_, i64>(3)? as u64,
                })
            })
            .map_err(|e| Error::query("failed to read table stats", e))
    }

    /// Fetch the stored record for a key.
    pub fn get(&self, key: &IdentityKey) -> Result<Option<Record>> {
        self.conn
            .query_row(&self.sql.select, params![key.order_id, key.product_id], parse_record_row)
            .optional()
            .map_err(|e| Error::query(&format!("failed to fetch {}", key), e))
    }

    /// Start the run's write transaction.
    ///
    /// The write lock is taken up front so another writer cannot slip in
    /// between an existence check and its insert.
    pub fn begin(&mut self) -> Result<OrderBatch<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::query("failed to begin transaction", e))?;
        Ok(OrderBatch { tx, sql: &self.sql })
    }

    /// Close the connection, surfacing any close error.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| Error::Connection(format!("failed to close: {}", e)))
    }
}

/// An open write transaction. Dropping it without [`OrderBatch::commit`]
/// rolls back every insert made through it.
pub struct OrderBatch<'a> {
    tx: Transaction<'a>,
    sql: &'a Statements,
}

impl OrderBatch<'_> {
    /// Create the identity index as part of this batch, so a rollback
    /// removes it together with the inserts.
    pub fn ensure_identity_index(&self) -> Result<()> {
        self.tx
            .execute_batch(&self.sql.identity_index)
            .map_err(|e| Error::query("failed to create identity index", e))
    }

    /// Whether a row with this identity key exists, including rows inserted
    /// earlier in this transaction.
    pub fn contains(&self, key: &IdentityKey) -> Result<bool> {
        let mut stmt = self
            .tx
            .prepare_cached(&self.sql.exists)
            .map_err(|e| Error::query("failed to prepare existence check", e))?;
        stmt.query_row(params![key.order_id, key.product_id], |_| Ok(()))
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| Error::query(&format!("existence check failed for {}", key), e))
    }

    /// Insert a record unconditionally.
    pub fn insert(&self, record: &Record) -> Result<()> {
        self.execute_insert(&self.sql.insert, record).map(|_| ())
    }

    /// Insert a record unless its identity key is already present.
    ///
    /// Requires the identity index. Returns whether a row was written.
    pub fn insert_or_ignore(&self, record: &Record) -> Result<bool> {
        self.execute_insert(&self.sql.insert_or_ignore, record)
            .map(|affected| affected == 1)
    }

    fn execute_insert(&self, sql: &str, record: &Record) -> Result<usize> {
        let mut stmt = self
            .tx
            .prepare_cached(sql)
            .map_err(|e| Error::query("failed to prepare insert", e))?;
        stmt.execute(named_params! {
            ":order_id": record.order_id,
            ":product_id": record.product_id,
            ":order_date": format_date(record.order_date),
            ":ship_date": format_date(record.ship_date),
            ":customer_name": record.customer_name,
            ":category": record.category,
            ":segment": record.segment,
            ":sales": record.sales,
            ":quantity": record.quantity,
            ":profit": record.profit,
        })
        .map_err(|e| Error::query(&format!("insert failed for {}", record.key()), e))
    }

    /// Make every insert of this batch durable.
    pub fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .map_err(|e| Error::query("failed to commit", e))
    }

    /// Discard every insert of this batch.
    pub fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .map_err(|e| Error::query("failed to roll back", e))
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn parse_date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, STORE_DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        order_id: row.get(0)?,
        product_id: row.get(1)?,
        order_date: parse_date_column(row, 2)?,
        ship_date: parse_date_column(row, 3)?,
        customer_name: row.get(4)?,
        category: row.get(5)?,
        segment: row.get(6)?,
        sales: row.get(7)?,
        quantity: row.get(8)?,
        profit: row.get(9)?,
    })
}
