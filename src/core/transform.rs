//! Transform module.
//!
//! Turns a raw [`SourceTable`] into typed [`Record`]s:
//! - header names are trimmed and spaces become underscores
//! - required columns are located by name, so column order does not matter
//! - `MM/DD/YYYY` dates are parsed into calendar dates

use crate::core::extract::SourceTable;
use crate::models::record::Record;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;

/// Date format used by the source file.
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Date format used by the store.
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns every source file must provide, after normalization.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Order_ID",
    "Product_ID",
    "Order_Date",
    "Ship_Date",
    "Customer_Name",
    "Category",
    "Segment",
    "Sales",
    "Quantity",
    "Profit",
];

/// Normalize a header name: trim and replace spaces with underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Parse a source date (`MM/DD/YYYY`).
pub fn normalize_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), SOURCE_DATE_FORMAT)
        .map_err(|e| Error::other(format!("invalid date '{}': {}", value, e)))
}

/// Render a date the way the store keeps it (`YYYY-MM-DD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format(STORE_DATE_FORMAT).to_string()
}

/// Positions of the required columns in a source table.
#[derive(Debug, Clone)]
struct ColumnMap {
    positions: HashMap<&'static str, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();

        let mut positions = HashMap::with_capacity(REQUIRED_COLUMNS.len());
        for &column in REQUIRED_COLUMNS {
            let idx = normalized
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| Error::MissingColumn(column.to_string()))?;
            positions.insert(column, idx);
        }

        Ok(Self { positions })
    }

    fn get<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn parse_number<T>(value: &str, column: &str, row: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| Error::InvalidRecord {
        row,
        message: format!("{} '{}': {}", column, value, e),
    })
}

fn parse_date(value: &str, column: &str, row: usize) -> Result<NaiveDate> {
    normalize_date(value).map_err(|e| Error::InvalidRecord {
        row,
        message: format!("{}: {}", column, e),
    })
}

/// Build one record from a data row. `row_number` is 1-based.
fn build_record(columns: &ColumnMap, row: &[String], row_number: usize) -> Result<Record> {
    let field = |name: &str| columns.get(row, name);

    Ok(Record {
        order_id: field("Order_ID").to_string(),
        product_id: field("Product_ID").to_string(),
        order_date: parse_date(field("Order_Date"), "Order_Date", row_number)?,
        ship_date: parse_date(field("Ship_Date"), "Ship_Date", row_number)?,
        customer_name: field("Customer_Name").to_string(),
        category: field("Category").to_string(),
        segment: field("Segment").to_string(),
        sales: parse_number(field("Sales"), "Sales", row_number)?,
        quantity: parse_number(field("Quantity"), "Quantity", row_number)?,
        profit: parse_number(field("Profit"), "Profit", row_number)?,
    })
}

/// Convert a source table into records, preserving row order.
pub fn transform(table: &SourceTable) -> Result<Vec<Record>> {
    let columns = ColumnMap::from_headers(&table.headers)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| build_record(&columns, row, idx + 1))
        .collect()
}
