//! Recursive file-name search.
//!
//! [`SearchEngine`] walks a tree with the [`Walker`] and records every entry
//! whose base name contains the query, case-insensitively. Files and
//! directories both match, and a matching directory is still descended into.
//!
//! The search is bounded: it stops after `max_matches` hits or after
//! `max_dirs` directories (the root counts as the first). Progress is a
//! rough estimate because the tree size is unknown up front: every
//! `progress_interval` directories it reports `min(dirs * 2, 95)`, and 100
//! once the search ends for any reason.
//!
//! # Example
//!
//! ```no_run
//! use proview::cancel::CancellationToken;
//! use proview::progress::NoopProgress;
//! use proview::search::{SearchConfig, SearchEngine};
//! use std::path::Path;
//!
//! let engine = SearchEngine::new(SearchConfig::default());
//! let outcome = engine.search(
//!     Path::new("/home/user"),
//!     "report",
//!     &CancellationToken::new(),
//!     &NoopProgress,
//! );
//! for path in &outcome.matches {
//!     println!("{}", path.display());
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::scanner::path_utils;
use crate::scanner::{Walker, WalkerConfig};

/// Default cap on recorded matches.
pub const DEFAULT_MAX_MATCHES: usize = 200;
/// Default cap on visited directories.
pub const DEFAULT_MAX_DIRS: usize = 2000;

/// Tunables for [`SearchEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Stop after this many matches.
    pub max_matches: usize,
    /// Stop after visiting this many directories, root included.
    pub max_dirs: usize,
    /// Report progress every N directories.
    pub progress_interval: usize,
    /// Queries shorter than this (in characters, after trimming) match nothing.
    pub min_query_len: usize,
    /// Skip hidden entries and do not descend into hidden directories.
    pub skip_hidden: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
            max_dirs: DEFAULT_MAX_DIRS,
            progress_interval: 5,
            min_query_len: 2,
            skip_hidden: false,
        }
    }
}

/// Result of one search run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    /// Matching paths in walk order.
    pub matches: Vec<PathBuf>,
    /// Directories visited, root included.
    pub dirs_visited: usize,
    /// True if the search stopped on `max_matches` or `max_dirs`.
    pub limit_reached: bool,
    /// True if the search stopped because it was cancelled.
    pub cancelled: bool,
}

/// Case-insensitive base-name search.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    /// Create an engine with the given limits.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search `root` for entries whose name contains `query`.
    ///
    /// Never fails: a missing or unreadable root gives an empty outcome,
    /// and unreadable entries below it are skipped.
    pub fn search(
        &self,
        root: &Path,
        query: &str,
        token: &CancellationToken,
        progress: &dyn ProgressCallback,
    ) -> SearchOutcome {
        let reporter = ProgressReporter::new(progress);
        let outcome = self.run(root, query, token, &reporter);
        reporter.finish();

        log::info!(
            "Search for '{}' in {}: {} matches in {} directories{}{}",
            query.trim(),
            root.display(),
            outcome.matches.len(),
            outcome.dirs_visited,
            if outcome.limit_reached { " (limit reached)" } else { "" },
            if outcome.cancelled { " (cancelled)" } else { "" },
        );
        outcome
    }

    fn run(
        &self,
        root: &Path,
        query: &str,
        token: &CancellationToken,
        reporter: &ProgressReporter<'_>,
    ) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        let needle = query.trim().to_lowercase();
        if needle.chars().count() < self.config.min_query_len {
            log::debug!(
                "Query '{}' shorter than {} characters, nothing to do",
                query.trim(),
                self.config.min_query_len
            );
            return outcome;
        }

        let root = path_utils::lexical_normalize(&path_utils::absolutize(root));
        if !root.is_dir() {
            log::warn!("Search root is not an accessible directory: {}", root.display());
            return outcome;
        }
        if token.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }

        let interval = self.config.progress_interval.max(1);
        let walker = Walker::new(
            &root,
            WalkerConfig {
                skip_hidden: self.config.skip_hidden,
                max_depth: None,
            },
        );

        outcome.dirs_visited = 1;
        if outcome.dirs_visited % interval == 0 {
            reporter.report(dir_progress(outcome.dirs_visited));
        }

        for entry in walker.walk(token) {
            let name = entry.file_name().to_lowercase();
            if name.contains(&needle) {
                // The tree may have changed since the parent was listed
                if entry.path.symlink_metadata().is_ok() {
                    log::trace!("Match: {}", entry.path.display());
                    outcome.matches.push(entry.path.clone());
                } else {
                    log::debug!("Dropping vanished match: {}", entry.path.display());
                }

                if outcome.matches.len() >= self.config.max_matches {
                    outcome.limit_reached = true;
                    break;
                }
            }

            if entry.is_dir {
                if outcome.dirs_visited >= self.config.max_dirs {
                    outcome.limit_reached = true;
                    break;
                }
                outcome.dirs_visited += 1;
                if outcome.dirs_visited % interval == 0 {
                    reporter.report(dir_progress(outcome.dirs_visited));
                }
            }
        }

        if token.is_cancelled() && !outcome.limit_reached {
            outcome.cancelled = true;
        }
        outcome
    }
}

fn dir_progress(dirs_visited: usize) -> u8 {
    dirs_visited.saturating_mul(2).min(95) as u8
}
