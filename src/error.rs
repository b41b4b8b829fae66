//! Error types for the Superstore ETL pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    // Source errors
    #[error("Failed to read source file: {0}")]
    SourceRead(String),

    #[error("Required column missing from source: {0}")]
    MissingColumn(String),

    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    // Store errors
    #[error("Cannot connect to store: {0}")]
    Connection(String),

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Wrap a store error raised while running a statement.
    pub(crate) fn query(context: &str, err: rusqlite::Error) -> Self {
        Error::Query(format!("{}: {}", context, err))
    }

    /// Whether the error came from reading or parsing the source file.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Error::SourceRead(_) | Error::MissingColumn(_) | Error::InvalidRecord { .. }
        )
    }

    /// Whether the error came from the store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Query(_))
    }
}
