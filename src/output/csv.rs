//! CSV output for duplicate reports, one row per file.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number
//! - `hash`: BLAKE3 content hash (hexadecimal)
//! - `path`: file path as scanned
//! - `size`: file size in bytes
//! - `role`: `original` for the first file of a group, else `duplicate`
//! - `modified`: modification time (RFC 3339), empty if unreadable

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;

use super::modified_rfc3339;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    hash: &'a str,
    path: String,
    size: u64,
    role: &'static str,
    modified: String,
}

/// CSV formatter over a slice of groups.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write header and rows to `writer`.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut out = csv::Writer::from_writer(writer);

        for (idx, group) in self.groups.iter().enumerate() {
            let hash = group.hash_hex();
            for (position, path) in group.files.iter().enumerate() {
                out.serialize(CsvRow {
                    group_id: idx + 1,
                    hash: &hash,
                    path: path.to_string_lossy().into_owned(),
                    size: group.size,
                    role: if position == 0 { "original" } else { "duplicate" },
                    modified: modified_rfc3339(path).unwrap_or_default(),
                })?;
            }
        }

        out.flush()?;
        Ok(())
    }

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_csv_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
