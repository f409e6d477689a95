//! Delimited text loading shared by the abundance and metadata tables.

use crate::error::{AssocError, Result};
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;

/// Untyped delimited table: a header row plus string records.
///
/// Records shorter than the header are padded with empty cells so every
/// record has exactly `header.len()` fields. Longer records are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names in file order.
    pub header: Vec<String>,
    /// Data rows, one `Vec` per line.
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    /// Load a table from a file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    /// Load a table from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        if header.is_empty() || header.iter().all(|h| h.is_empty()) {
            return Err(AssocError::EmptyData("Table has no header row".to_string()));
        }

        let mut records = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            if record.len() > header.len() {
                return Err(AssocError::RaggedRecord {
                    line: record.position().map_or(0, |p| p.line()),
                    found: record.len(),
                    expected: header.len(),
                });
            }
            let mut fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            fields.resize(header.len(), String::new());
            records.push(fields);
        }

        Ok(Self { header, records })
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Number of data rows.
    pub fn n_rows(&self) -> usize {
        self.records.len()
    }
}

/// Parse a user-supplied delimiter.
///
/// Accepts a single ASCII character, or the escapes `\t` / `tab` for TSV.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "\t" | "tab" | "TAB" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        other => Err(AssocError::InvalidParameter(format!(
            "Delimiter must be a single ASCII character or '\\t', got '{}'",
            other
        ))),
    }
}

/// True for cells that pandas-style loaders treat as missing.
pub(crate) fn is_missing_token(cell: &str) -> bool {
    matches!(cell, "" | "NA" | "na" | "NaN" | "nan" | "N/A")
}
