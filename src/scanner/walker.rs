//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`Walker`] enumerates everything below a root in deterministic pre-order:
//! a directory comes before its children and siblings are sorted by file
//! name. The root itself is not yielded.
//!
//! # Guarantees
//!
//! - Symbolic links are yielded as leaves and never traversed, so symlink
//!   cycles cannot cause loops.
//! - Per-entry failures (permission denied, vanished paths, unreadable
//!   metadata) are logged and skipped. A missing root yields nothing.
//! - The cancellation token is checked before every yielded entry. Once it
//!   is set the iterator simply ends.
//! - walkdir keeps one directory handle open per level, and each task walks
//!   sequentially, so descriptor usage stays bounded by tree depth.
//!
//! # Example
//!
//! ```no_run
//! use proview::cancel::CancellationToken;
//! use proview::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let token = CancellationToken::new();
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files = walker.walk(&token).filter(|e| e.is_file()).count();
//! println!("Found {} files", files);
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ScanError, WalkEntry, WalkerConfig};
use crate::cancel::CancellationToken;

/// Resilient, cancellable directory walker.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use proview::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Root this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree, skipping entries that cannot be read.
    ///
    /// The returned iterator is lazy, finite and not restartable.
    pub fn walk(&self, token: &CancellationToken) -> impl Iterator<Item = WalkEntry> + '_ {
        self.walk_with_errors(token).filter_map(Result::ok)
    }

    /// Walk the tree, yielding per-entry failures as [`ScanError`] values
    /// instead of dropping them. Iteration never stops on an error.
    pub fn walk_with_errors(
        &self,
        token: &CancellationToken,
    ) -> impl Iterator<Item = Result<WalkEntry, ScanError>> + '_ {
        let token = token.clone();
        let skip_hidden = self.config.skip_hidden;

        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walk_dir = walk_dir.max_depth(depth);
        }

        walk_dir
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && entry.depth() > 0 && is_hidden(entry)))
            .take_while(move |_| {
                if token.is_cancelled() {
                    log::debug!("Walker: cancellation requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .map(move |result| match result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Err(self.handle_walk_error(e)),
            })
    }

    /// Convert a walkdir entry into a [`WalkEntry`].
    fn process_entry(&self, entry: &walkdir::DirEntry) -> Result<WalkEntry, ScanError> {
        let path = entry.path();
        let is_symlink = entry.path_is_symlink();

        // follow_links(false) means this is the link's own metadata
        let metadata = entry.metadata().map_err(|e| self.handle_walk_error(e))?;

        let is_dir = !is_symlink && metadata.is_dir();
        let size = if is_dir { 0 } else { metadata.len() };

        log::trace!("Walker: {}", path.display());

        Ok(WalkEntry {
            path: path.to_path_buf(),
            is_dir,
            is_symlink,
            size,
            modified: metadata.modified().ok(),
        })
    }

    /// Map a walkdir error to a [`ScanError`], logging it on the way.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            log::warn!(
                "Filesystem loop: {} points back to {}",
                path.display(),
                ancestor.display()
            );
            return ScanError::Loop(path);
        }

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(ErrorKind::NotFound) => {
                log::debug!("Path not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk error"));
                ScanError::Io { path, source }
            }
        }
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
