//! Machine-readable output for task results.
//!
//! - [`json`]: duplicate reports, search results and file-operation results
//! - [`csv`]: duplicate reports, one row per file
//!
//! # Example
//!
//! ```no_run
//! use proview::cancel::CancellationToken;
//! use proview::duplicates::{find_duplicates_in, FinderConfig};
//! use proview::error::ExitCode;
//! use proview::output::json::JsonReport;
//! use proview::progress::NoopProgress;
//! use std::path::Path;
//!
//! let outcome = find_duplicates_in(
//!     Path::new("."),
//!     FinderConfig::default(),
//!     &CancellationToken::new(),
//!     &NoopProgress,
//! );
//! if let Some(report) = outcome.report() {
//!     let json = JsonReport::new(report, ExitCode::Success);
//!     println!("{}", json.to_json_pretty().unwrap());
//! }
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

pub mod csv;
pub mod json;

pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::{
    write_json, JsonFileOperation, JsonOutputError, JsonReport, JsonSearch,
};

/// Modification time of `path` in RFC 3339, if it can be read.
#[must_use]
pub fn modified_rfc3339(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let datetime: DateTime<Utc> = modified.into();
    Some(datetime.to_rfc3339())
}
