//! JSON output for scripting and automation.
//!
//! # Duplicate report schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "wasted_bytes": 1024,
//!       "files": [
//!         { "path": "/a/file.txt", "modified": "2024-01-01T00:00:00+00:00" },
//!         { "path": "/b/file.txt", "modified": null }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_groups": 5,
//!     "reclaimable_space": 51200,
//!     "exit_code": 0,
//!     "exit_code_name": "PV000"
//!   }
//! }
//! ```
//!
//! Search and file-operation results have their own flat objects,
//! [`JsonSearch`] and [`JsonFileOperation`].

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::actions::transfer::{FileOperationResult, OperationKind};
use crate::duplicates::{DuplicateGroup, DuplicateReport, ScanSummary};
use crate::error::ExitCode;
use crate::search::SearchOutcome;

use super::modified_rfc3339;

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing JSON: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize `value` to `writer`, followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<T: Serialize, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One member of a duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Path as scanned
    pub path: String,
    /// Modification time (RFC 3339), `null` if unreadable
    pub modified: Option<String>,
}

/// A duplicate group in JSON form. `files[0]` is the original.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// Size of each member in bytes
    pub size: u64,
    /// Bytes reclaimable from this group
    pub wasted_bytes: u64,
    /// Members, original first
    pub files: Vec<JsonFile>,
}

impl JsonDuplicateGroup {
    /// Convert a group, reading each member's modification time.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            wasted_bytes: group.wasted_bytes,
            files: group
                .files
                .iter()
                .map(|p| JsonFile {
                    path: path_string(p),
                    modified: modified_rfc3339(p),
                })
                .collect(),
        }
    }
}

/// Summary statistics in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Roots walked
    pub roots_scanned: usize,
    /// Files that passed the size filter
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Files that shared a size and were hashed
    pub potential_duplicates: usize,
    /// Files that could not be hashed
    pub hash_failures: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, originals excluded
    pub duplicate_files: usize,
    /// Bytes reclaimable by removing every duplicate
    pub reclaimable_space: u64,
    /// Scan duration in milliseconds
    pub scan_duration_ms: u64,
    /// Process exit code
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g. "PV000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build from scan statistics and the exit code of the run.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            roots_scanned: summary.roots_scanned,
            total_files: summary.total_files,
            total_size: summary.total_size,
            potential_duplicates: summary.potential_duplicates,
            hash_failures: summary.hash_failures,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete duplicate report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// Duplicate groups in discovery order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan statistics
    pub summary: JsonSummary,
}

impl JsonReport {
    /// Convert a finished report.
    #[must_use]
    pub fn new(report: &DuplicateReport, exit_code: ExitCode) -> Self {
        Self {
            duplicates: report
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(&report.summary, exit_code),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Search result in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSearch {
    /// Searched root
    pub root: String,
    /// Query as given
    pub query: String,
    /// Matching paths in walk order
    pub matches: Vec<String>,
    /// Directories visited
    pub dirs_visited: usize,
    /// Whether a match or directory limit stopped the search
    pub limit_reached: bool,
    /// Whether the search was cancelled
    pub cancelled: bool,
}

impl JsonSearch {
    /// Convert a search outcome.
    #[must_use]
    pub fn new(root: &Path, query: &str, outcome: &SearchOutcome) -> Self {
        Self {
            root: path_string(root),
            query: query.to_string(),
            matches: outcome.matches.iter().map(|p| path_string(p)).collect(),
            dirs_visited: outcome.dirs_visited,
            limit_reached: outcome.limit_reached,
            cancelled: outcome.cancelled,
        }
    }
}

/// One failed item of a file operation.
#[derive(Debug, Clone, Serialize)]
pub struct JsonItemError {
    /// Source path
    pub path: String,
    /// Failure message
    pub message: String,
}

/// File-operation result in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFileOperation {
    /// `"copy"` or `"move"`
    pub kind: OperationKind,
    /// Sources requested
    pub total: usize,
    /// Sources processed successfully
    pub success_count: usize,
    /// Failed sources
    pub errors: Vec<JsonItemError>,
    /// Whether the batch was cancelled
    pub cancelled: bool,
}

impl From<&FileOperationResult> for JsonFileOperation {
    fn from(result: &FileOperationResult) -> Self {
        Self {
            kind: result.kind,
            total: result.total,
            success_count: result.success_count,
            errors: result
                .errors
                .iter()
                .map(|e| JsonItemError {
                    path: path_string(&e.path),
                    message: e.message.clone(),
                })
                .collect(),
            cancelled: result.cancelled,
        }
    }
}
