//! Superstore ETL Library
//!
//! Incremental, idempotent loading of retail order records from a CSV file
//! into a SQLite table keyed by `(order_id, product_id)`.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;

pub use error::{Error, Result};
