//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Cancellable, pre-order directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//! - Unicode and lexical path normalization
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal that never follows symlinks
//! - [`hasher`]: BLAKE3 file hashing (streaming, cancellable)
//! - [`path_utils`]: Path comparison helpers
//!
//! # Example
//!
//! ```no_run
//! use proview::cancel::CancellationToken;
//! use proview::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let token = CancellationToken::new();
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk(&token) {
//!     if !entry.is_dir {
//!         println!("{}: {} bytes", entry.path.display(), entry.size);
//!     }
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, DEFAULT_CHUNK_SIZE};
pub use walker::Walker;

/// One entry produced by the [`Walker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path of the entry
    pub path: PathBuf,
    /// True for real directories (never for a symlink to a directory)
    pub is_dir: bool,
    /// True for symbolic links, which are never traversed
    pub is_symlink: bool,
    /// Size in bytes; 0 for directories
    pub size: u64,
    /// Last modification time, if the platform could report it
    pub modified: Option<SystemTime>,
}

impl WalkEntry {
    /// True for regular files (not directories, not symlinks).
    #[must_use]
    pub fn is_file(&self) -> bool {
        !self.is_dir && !self.is_symlink
    }

    /// Base name of the entry as a lossy UTF-8 string.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    /// A hidden directory is not descended into.
    pub skip_hidden: bool,

    /// Maximum depth below the root (1 = direct children only).
    /// `None` walks the whole tree.
    pub max_depth: Option<usize>,
}

impl WalkerConfig {
    /// Create a configuration.
    #[must_use]
    pub fn new(skip_hidden: bool, max_depth: Option<usize>) -> Self {
        Self {
            skip_hidden,
            max_depth,
        }
    }
}

/// Errors that can occur during directory scanning.
///
/// The walker logs and skips these; they are surfaced only through
/// [`Walker::walk_with_errors`].
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A directory cycle was detected.
    #[error("Filesystem loop at {0}")]
    Loop(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because cancellation was requested.
    #[error("Hashing cancelled: {0}")]
    Cancelled(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
