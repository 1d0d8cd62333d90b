//! Deletion of duplicate files, to the system trash or permanently.
//!
//! # Overview
//!
//! - [`select_duplicates`] picks every member of each group except the
//!   original (`files[0]`).
//! - [`validate_preserves_copy`] and [`validate_selection`] refuse any
//!   selection that would remove every copy of a group.
//! - [`delete_batch`] deletes a list of paths, recording failures per path
//!   and never aborting the batch. Directories are removed recursively.
//!
//! Every path is re-checked right before it is deleted, so a file that
//! vanished since the scan is reported as not found rather than silently
//! counted.
//!
//! # Example
//!
//! ```no_run
//! use proview::actions::delete::delete_to_trash;
//! use std::path::PathBuf;
//!
//! let copy = PathBuf::from("/photos/2023/IMG_0001 (1).jpg");
//! if let Ok(done) = delete_to_trash(&copy) {
//!     println!("{} bytes to trash", done.size);
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cancel::CancellationToken;
use crate::duplicates::DuplicateGroup;
use crate::progress::{ProgressCallback, ProgressReporter};

/// Why a single path could not be deleted.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The path vanished after the scan.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Its metadata could not be read.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The platform trash refused the path.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Removing the file or tree failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// A selection covers every member of some group.
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// Any other metadata error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// The offending path. `None` for selection errors.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_metadata_error(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// One deleted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// Deleted path.
    pub path: PathBuf,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// `false` when the path went to the trash.
    pub permanent: bool,
}

impl DeleteResult {
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Outcome of [`delete_batch`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDeleteResult {
    /// Deleted paths, in request order.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their error text.
    pub failures: Vec<(PathBuf, String)>,
    /// Sum of `size` over `successes`.
    pub bytes_freed: u64,
    /// True if the batch stopped early on cancellation.
    pub cancelled: bool,
}

impl BatchDeleteResult {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Paths attempted before the batch ended.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.success_count() + self.failure_count()
    }

    /// True if no attempted path failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary for logs and the CLI.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// `[delete]` section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteConfig {
    /// Bypass the trash.
    pub permanent: bool,
}

impl DeleteConfig {
    /// Deletes go to the trash.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Deletes are unrecoverable.
    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// Size of a path for accounting: file length, 0 for directories.
fn accounted_size(path: &Path) -> Result<u64, DeleteError> {
    let metadata =
        fs::symlink_metadata(path).map_err(|e| DeleteError::from_metadata_error(path, e))?;
    Ok(if metadata.is_dir() { 0 } else { metadata.len() })
}

/// Move a file or directory to the system trash.
///
/// # Errors
///
/// - `NotFound` if the path doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = accounted_size(path)?;

    trash::delete(path).map_err(|e| {
        log::error!("Could not trash {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Trashed {} ({} bytes)", path.display(), size);
    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a file, symlink or directory tree.
///
/// **WARNING**: This cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the path doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `PermanentDeleteFailed` if the removal fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = accounted_size(path)?;

    crate::actions::transfer::remove_entry(path).map_err(|e| {
        log::error!("Could not remove {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Removed {} ({} bytes)", path.display(), size);
    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Delete one path according to `config`.
///
/// # Errors
///
/// See [`delete_to_trash`] and [`permanent_delete`].
pub fn delete_path(path: &Path, config: &DeleteConfig) -> Result<DeleteResult, DeleteError> {
    if config.permanent {
        permanent_delete(path)
    } else {
        delete_to_trash(path)
    }
}

/// Delete multiple paths.
///
/// Every path is attempted; failures are collected. Cancellation is polled
/// before each path and progress is reported per path.
pub fn delete_batch(
    paths: &[PathBuf],
    config: &DeleteConfig,
    token: &CancellationToken,
    progress: &dyn ProgressCallback,
) -> BatchDeleteResult {
    let reporter = ProgressReporter::new(progress);
    let mut result = BatchDeleteResult::default();
    let total = paths.len();

    for (index, path) in paths.iter().enumerate() {
        if token.is_cancelled() {
            log::info!("Deletion cancelled after {} of {} path(s)", index, total);
            result.cancelled = true;
            break;
        }

        match delete_path(path, config) {
            Ok(del) => {
                result.bytes_freed += del.size;
                result.successes.push(del);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                result.failures.push((path.clone(), e.to_string()));
            }
        }

        reporter.report_fraction(index + 1, total);
    }

    log::info!("{}", result.summary());
    result
}

/// Every non-original member of every group, in group order.
#[must_use]
pub fn select_duplicates(groups: &[DuplicateGroup]) -> Vec<PathBuf> {
    groups
        .iter()
        .flat_map(|g| g.duplicates().iter().cloned())
        .collect()
}

/// Check that `selected_paths` leaves at least one member of `group_paths`.
///
/// # Errors
///
/// `AllCopiesWouldBeDeleted` if nothing in the group would survive.
///
/// # Example
///
/// ```
/// use proview::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group: Vec<PathBuf> = ["/a.bin", "/b.bin", "/c.bin"].iter().map(PathBuf::from).collect();
///
/// assert!(validate_preserves_copy(&group[1..], &group).is_ok());
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    let selected: HashSet<&PathBuf> = selected_paths.iter().collect();
    let survivors = group_paths.iter().filter(|p| !selected.contains(p)).count();

    if survivors == 0 && !group_paths.is_empty() {
        log::error!(
            "Refusing to delete all {} members of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        Ok(())
    }
}

/// Validate a selection against every group of a report.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if any group would lose every member.
pub fn validate_selection(
    selected_paths: &[PathBuf],
    groups: &[DuplicateGroup],
) -> Result<(), DeleteError> {
    groups
        .iter()
        .try_for_each(|g| validate_preserves_copy(selected_paths, &g.files))
}
