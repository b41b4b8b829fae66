//! Source extraction module.
//!
//! Reads a delimited file into an in-memory table of decoded strings.
//! Column names are kept exactly as they appear in the file; header
//! normalization happens in the transform stage.

use crate::models::config::SourceConfig;
use crate::{Error, Result};
use encoding_rs::Encoding;
use std::path::Path;

/// A delimited file held in memory.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    /// Raw header names.
    pub headers: Vec<String>,
    /// Data rows, each as long as `headers`.
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolve an encoding label such as "latin1" or "utf-8".
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::SourceRead(format!("unknown encoding '{}'", label)))
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(Error::SourceRead(format!(
            "delimiter must be a single ASCII character, got '{}'",
            delimiter
        )))
    }
}

fn decode_field(
    field: &[u8],
    encoding: &'static Encoding,
    strip_bom: bool,
    line: u64,
) -> Result<String> {
    let (text, had_errors) = if strip_bom {
        let (text, _, had_errors) = encoding.decode(field);
        (text, had_errors)
    } else {
        encoding.decode_without_bom_handling(field)
    };

    if had_errors {
        return Err(Error::SourceRead(format!(
            "line {}: field is not valid {}",
            line,
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Read a delimited file.
pub fn read_source(path: &Path, config: &SourceConfig) -> Result<SourceTable> {
    let encoding = resolve_encoding(&config.encoding)?;
    let delimiter = delimiter_byte(config.delimiter)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::SourceRead(format!("{}: {}", path.display(), e)))?;

    let header_record = reader
        .byte_headers()
        .map_err(|e| Error::SourceRead(format!("{}: {}", path.display(), e)))?
        .clone();

    let mut headers = Vec::with_capacity(header_record.len());
    for (idx, field) in header_record.iter().enumerate() {
        headers.push(decode_field(field, encoding, idx == 0, 1)?);
    }

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record =
            result.map_err(|e| Error::SourceRead(format!("{}: {}", path.display(), e)))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let mut row = Vec::with_capacity(record.len());
        for field in record.iter() {
            row.push(decode_field(field, encoding, false, line)?);
        }
        rows.push(row);
    }

    tracing::debug!(
        "Read {} columns and {} rows from {} ({})",
        headers.len(),
        rows.len(),
        path.display(),
        encoding.name()
    );

    Ok(SourceTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_config() -> SourceConfig {
        SourceConfig {
            encoding: "utf-8".to_string(),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_read_simple_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.csv");
        fs::write(&path, "Order ID,Sales\nA,1.5\nB,2\n").unwrap();

        let table = read_source(&path, &utf8_config()).unwrap();
        assert_eq!(table.headers, vec!["Order ID", "Sales"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["B", "2"]);
    }

    #[test]
    fn test_latin1_decoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.csv");
        // "Customer Name\nJos\xe9" in Windows-1252
        fs::write(&path, b"Customer Name\nJos\xe9\n").unwrap();

        let table = read_source(&path, &SourceConfig::default()).unwrap();
        assert_eq!(table.rows[0][0], "José");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.csv");
        fs::write(&path, b"Customer Name\nJos\xe9\n").unwrap();

        let result = read_source(&path, &utf8_config());
        assert!(matches!(result, Err(Error::SourceRead(_))));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.csv");
        fs::write(&path, b"\xef\xbb\xbfOrder ID\nA\n").unwrap();

        let table = read_source(&path, &utf8_config()).unwrap();
        assert_eq!(table.headers[0], "Order ID");
    }

    #[test]
    fn test_custom_delimiter() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.tsv");
        fs::write(&path, "a\tb\n1\t2\n").unwrap();

        let config = SourceConfig {
            delimiter: '\t',
            ..utf8_config()
        };
        let table = read_source(&path, &config).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_uneven_rows_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.csv");
        fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        let result = read_source(&path, &utf8_config());
        assert!(matches!(result, Err(Error::SourceRead(_))));
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(resolve_encoding("klingon").is_err());
        assert_eq!(resolve_encoding("latin1").unwrap().name(), "windows-1252");
    }
}
