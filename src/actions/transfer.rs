//! Bulk copy and move into a destination directory.
//!
//! # Overview
//!
//! [`execute`] processes a [`FileOperationRequest`] one source at a time.
//! The destination is validated once up front; after that every source is
//! handled in isolation and a failure is recorded in the result's error list
//! without stopping the batch.
//!
//! # Per-item rules
//!
//! - A source that no longer exists is reported, not skipped silently.
//! - A directory is never copied or moved into itself or one of its own
//!   descendants. Paths are compared in absolute, lexically normalized,
//!   NFC form.
//! - Name clashes in the destination are resolved by appending
//!   `_copy_{N}` before the extension (`a.txt` becomes `a_copy_1.txt`).
//! - Directory copies create every directory fresh and never merge into an
//!   existing one. File copies keep permissions and timestamps. Symbolic
//!   links inside a copied tree are recreated as links on Unix.
//! - A move is an atomic rename. When source and destination live on
//!   different filesystems it falls back to copy followed by deleting the
//!   source.
//!
//! Cancellation is checked before each source; a cancelled batch returns
//! the results gathered so far.
//!
//! # Example
//!
//! ```no_run
//! use proview::actions::transfer::{execute, FileOperationRequest, OperationKind};
//! use proview::cancel::CancellationToken;
//! use proview::progress::NoopProgress;
//! use std::path::PathBuf;
//!
//! let request = FileOperationRequest::new(
//!     vec![PathBuf::from("/home/user/report.pdf")],
//!     PathBuf::from("/mnt/backup"),
//!     OperationKind::Copy,
//! );
//! let result = execute(&request, &CancellationToken::new(), &NoopProgress).unwrap();
//! println!("{} copied, {} failed", result.success_count, result.errors.len());
//! ```

use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cancel::CancellationToken;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::scanner::path_utils;

/// Copy or move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Duplicate the sources, leaving them in place.
    Copy,
    /// Relocate the sources.
    Move,
}

impl OperationKind {
    /// Lowercase verb, as used in messages.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }

    /// Title for a fatal error of this operation, e.g. `"Copy Error"`.
    #[must_use]
    pub fn error_title(self) -> &'static str {
        match self {
            Self::Copy => "Copy Error",
            Self::Move => "Move Error",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A batch of sources to copy or move into one destination directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperationRequest {
    /// Files and directories to process, in order
    pub sources: Vec<PathBuf>,
    /// Existing directory receiving the sources
    pub destination: PathBuf,
    /// Copy or move
    pub kind: OperationKind,
}

impl FileOperationRequest {
    /// Create a request.
    #[must_use]
    pub fn new(sources: Vec<PathBuf>, destination: PathBuf, kind: OperationKind) -> Self {
        Self {
            sources,
            destination,
            kind,
        }
    }
}

/// Failure of a single source within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    /// Source path that failed
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

impl ItemError {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Base name of the failed source.
    #[must_use]
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name(), self.message)
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOperationResult {
    /// Operation performed
    pub kind: OperationKind,
    /// Sources processed successfully
    pub success_count: usize,
    /// Sources that failed, in processing order
    pub errors: Vec<ItemError>,
    /// Number of sources in the request
    pub total: usize,
    /// True if the batch stopped early on cancellation
    pub cancelled: bool,
}

impl FileOperationResult {
    fn new(kind: OperationKind, total: usize) -> Self {
        Self {
            kind,
            success_count: 0,
            errors: Vec::new(),
            total,
            cancelled: false,
        }
    }

    /// Sources that were attempted (succeeded or failed).
    #[must_use]
    pub fn processed(&self) -> usize {
        self.success_count + self.errors.len()
    }

    /// True if every source was processed without error.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty() && !self.cancelled && self.success_count == self.total
    }

    /// Human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let past = match self.kind {
            OperationKind::Copy => "Copied",
            OperationKind::Move => "Moved",
        };
        let mut text = format!("{} {} of {} item(s)", past, self.success_count, self.total);
        if !self.errors.is_empty() {
            text.push_str(&format!(", {} failed", self.errors.len()));
        }
        if self.cancelled {
            text.push_str(" (cancelled)");
        }
        text
    }
}

/// Fatal errors that stop a batch before any source is touched.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination is missing or not a directory.
    #[error("Invalid destination directory.")]
    InvalidDestination(PathBuf),
}

/// Run a copy or move batch.
///
/// Emits one progress value per processed source, `(i + 1) * 100 / total`.
///
/// # Errors
///
/// Returns [`TransferError::InvalidDestination`] without touching anything
/// or reporting progress if the destination is not an existing directory.
pub fn execute(
    request: &FileOperationRequest,
    token: &CancellationToken,
    progress: &dyn ProgressCallback,
) -> Result<FileOperationResult, TransferError> {
    let destination = &request.destination;
    if !destination.is_dir() {
        log::warn!(
            "{}: destination is not a directory: {}",
            request.kind.error_title(),
            destination.display()
        );
        return Err(TransferError::InvalidDestination(destination.clone()));
    }

    let reporter = ProgressReporter::new(progress);
    let total = request.sources.len();
    let mut result = FileOperationResult::new(request.kind, total);

    log::info!(
        "Starting {} of {} item(s) into {}",
        request.kind,
        total,
        destination.display()
    );

    for (i, source) in request.sources.iter().enumerate() {
        if token.is_cancelled() {
            log::info!("File operation cancelled after {} item(s)", i);
            result.cancelled = true;
            break;
        }

        match process_item(source, destination, request.kind) {
            Ok(target) => {
                log::debug!("{} {} -> {}", request.kind, source.display(), target.display());
                result.success_count += 1;
            }
            Err(error) => {
                log::warn!("{}", error);
                result.errors.push(error);
            }
        }

        reporter.report_fraction(i + 1, total);
    }

    log::info!("{}", result.summary());
    Ok(result)
}

/// Handle one source. Returns the path it ended up at.
fn process_item(
    source: &Path,
    destination: &Path,
    kind: OperationKind,
) -> Result<PathBuf, ItemError> {
    // symlink_metadata so a dangling link is still a valid source
    if fs::symlink_metadata(source).is_err() {
        return Err(ItemError::new(source, "Source no longer exists"));
    }

    if path_utils::is_same_or_within(destination, source) {
        return Err(ItemError::new(
            source,
            format!("Cannot {} to itself or subdirectory", kind),
        ));
    }

    let Some(file_name) = source.file_name() else {
        return Err(ItemError::new(source, "Source has no file name"));
    };
    let target = conflict_free_target(destination, &file_name.to_string_lossy());

    let outcome = match kind {
        OperationKind::Copy => copy_entry(source, &target),
        OperationKind::Move => move_entry(source, &target),
    };
    outcome
        .map(|()| target)
        .map_err(|e| ItemError::new(source, e.to_string()))
}

/// First path in `dir` for `file_name` that does not exist yet.
///
/// Tries `file_name` itself, then `{stem}_copy_{N}{.ext}` for N = 1, 2, ...
/// Names without an extension (including dot-files such as `.bashrc`)
/// become `{name}_copy_{N}`. Existence is checked without following
/// symlinks, so a dangling link still occupies its name.
#[must_use]
pub fn conflict_free_target(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !occupied(&candidate) {
        return candidate;
    }

    let (stem, ext) = split_extension(file_name);
    (1u64..)
        .map(|n| dir.join(format!("{}_copy_{}{}", stem, n, ext)))
        .find(|p| !occupied(p))
        .unwrap_or(candidate)
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Split `name` into `(stem, ".ext")`. A leading dot does not start an
/// extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && name[..idx].chars().any(|c| c != '.') => {
            (&name[..idx], &name[idx..])
        }
        _ => (name, ""),
    }
}

/// Copy a file, directory tree or symlink to `dest`, which must not exist.
///
/// # Errors
///
/// Any I/O error, including `AlreadyExists` if `dest` or a directory inside
/// the copied tree is already present.
pub fn copy_entry(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(src)?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        copy_symlink(src, dest)
    } else if file_type.is_dir() {
        copy_dir(src, dest, &meta)
    } else {
        copy_file(src, dest, &meta)
    }
}

fn copy_dir(src: &Path, dest: &Path, meta: &fs::Metadata) -> io::Result<()> {
    fs::create_dir(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        copy_entry(&entry.path(), &dest.join(entry.file_name()))?;
    }
    fs::set_permissions(dest, meta.permissions())?;
    preserve_times(dest, meta);
    Ok(())
}

fn copy_file(src: &Path, dest: &Path, meta: &fs::Metadata) -> io::Result<()> {
    if occupied(dest) {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("Destination already exists: {}", dest.display()),
        ));
    }
    // fs::copy carries the permission bits over
    fs::copy(src, dest)?;
    preserve_times(dest, meta);
    Ok(())
}

fn preserve_times(dest: &Path, meta: &fs::Metadata) {
    let mtime = FileTime::from_last_modification_time(meta);
    let atime = FileTime::from_last_access_time(meta);
    if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
        log::debug!("Could not preserve timestamps on {}: {}", dest.display(), e);
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    if meta.is_dir() {
        return Err(io::Error::new(
            ErrorKind::Unsupported,
            "Refusing to copy a directory symlink",
        ));
    }
    copy_file(src, dest, &meta)
}

/// Move `src` to `dest`, falling back to copy-then-delete across devices.
///
/// Once the fallback copy is complete it is never removed again. If the
/// source cannot be fully removed the error is returned and the entry may
/// exist in both places, but no data is lost.
///
/// # Errors
///
/// Any I/O error from the rename, the copy or the source removal.
pub fn move_entry(src: &Path, dest: &Path) -> io::Result<()> {
    if occupied(dest) {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("Destination already exists: {}", dest.display()),
        ));
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            log::debug!(
                "Rename across devices failed ({}), copying {} instead",
                e,
                src.display()
            );
            move_by_copy(src, dest, remove_entry)
        }
        Err(e) => Err(e),
    }
}

/// Copy `src` to `dest`, then remove the source with `remove_source`.
///
/// A failed copy leaves the source untouched. A failed removal keeps the
/// complete copy at `dest`: the removal may already have deleted part of
/// the source.
fn move_by_copy<F>(src: &Path, dest: &Path, remove_source: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    copy_entry(src, dest)?;
    remove_source(src).map_err(|e| {
        log::warn!(
            "Copied {} to {} but could not remove the source: {}",
            src.display(),
            dest.display(),
            e
        );
        io::Error::new(e.kind(), format!("Copied but failed to remove source: {}", e))
    })
}

/// Remove a file, symlink or whole directory tree without following links.
pub(crate) fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV on Unix, ERROR_NOT_SAME_DEVICE on Windows
    if cfg!(windows) {
        err.raw_os_error() == Some(17)
    } else {
        err.raw_os_error() == Some(18)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
