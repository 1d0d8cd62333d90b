//! Duplicate finder orchestrating the three-stage detection pipeline.
//!
//! # Pipeline
//!
//! 1. **Scan**: walk every root and bucket regular files by exact size.
//!    Directories and symlinks are skipped, as are files below `min_size`.
//! 2. **Hash**: stream every member of a multi-file size bucket through
//!    BLAKE3. Files that cannot be read are dropped from consideration.
//! 3. **Assemble**: every hash bucket with two or more members becomes a
//!    [`DuplicateGroup`], ordered oldest file first.
//!
//! All three stages run sequentially on the calling thread. The
//! [`CancellationToken`] is honoured between files in every stage and
//! between chunks while hashing; a cancelled run returns
//! [`ScanOutcome::Cancelled`] with no partial report.
//!
//! # Progress
//!
//! Status text is emitted at stage boundaries and every `status_interval`
//! scanned files. Percentages are only reported while hashing, as
//! `processed * 100 / potential` every `progress_interval` files, and 100 on
//! completion.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

use super::groups::{order_by_mtime, DuplicateGroup, GroupingStats, HashGroups, SizeGroups};
use crate::cancel::CancellationToken;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::scanner::{path_utils, HashError, Hasher, Walker, WalkerConfig, DEFAULT_CHUNK_SIZE};

/// Configuration for the duplicate finder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Files smaller than this many bytes are ignored.
    pub min_size: u64,
    /// Emit "Scanned N files..." every N files.
    pub status_interval: usize,
    /// Report hashing progress every N files.
    pub progress_interval: usize,
    /// Read size per hashing chunk in bytes.
    pub chunk_size: usize,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            status_interval: 50,
            progress_interval: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_hidden: false,
        }
    }
}

impl FinderConfig {
    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    /// Roots actually walked after dropping missing and nested ones
    pub roots_scanned: usize,
    /// Files that passed the size filter
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Files eliminated because no other file had the same size
    pub eliminated_by_size: usize,
    /// Files that shared a size with another file and were hashed
    pub potential_duplicates: usize,
    /// Files dropped because they could not be read while hashing
    pub hash_failures: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    #[serde(with = "duration_secs")]
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    fn absorb_grouping(&mut self, stats: &GroupingStats) {
        self.total_files = stats.total_files;
        self.total_size = stats.total_size;
        self.eliminated_by_size = stats.eliminated_unique;
        self.potential_duplicates = stats.potential_duplicates;
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// Completed duplicate scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateReport {
    /// Confirmed groups in discovery order
    pub groups: Vec<DuplicateGroup>,
    /// Sum of `wasted_bytes` across all groups
    pub total_wasted: u64,
    /// Scan statistics
    pub summary: ScanSummary,
}

impl DuplicateReport {
    /// True when no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of duplicate files (excluding originals).
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }
}

/// Terminal state of a duplicate scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The scan ran to the end. The report may be empty.
    Completed(DuplicateReport),
    /// The scan was cancelled; nothing is reported.
    Cancelled,
}

impl ScanOutcome {
    /// True for [`ScanOutcome::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Borrow the report of a completed scan.
    #[must_use]
    pub fn report(&self) -> Option<&DuplicateReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Cancelled => None,
        }
    }

    /// Take the report of a completed scan.
    #[must_use]
    pub fn into_report(self) -> Option<DuplicateReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Cancelled => None,
        }
    }
}

/// Duplicate finder that runs the scan, hash and assemble stages.
///
/// # Example
///
/// ```no_run
/// use proview::cancel::CancellationToken;
/// use proview::duplicates::{DuplicateFinder, FinderConfig, ScanOutcome};
/// use proview::progress::NoopProgress;
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(1024));
/// let roots = vec![PathBuf::from("/home/user/Downloads")];
///
/// match finder.find_duplicates(&roots, &CancellationToken::new(), &NoopProgress) {
///     ScanOutcome::Completed(report) => {
///         println!("Found {} duplicate groups", report.groups.len());
///         println!("Reclaimable space: {}", report.summary.reclaimable_display());
///     }
///     ScanOutcome::Cancelled => println!("Scan cancelled"),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find duplicate files below `roots`.
    ///
    /// Never fails: unreadable roots, directories and files are skipped and
    /// the run completes with whatever could be examined.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
        token: &CancellationToken,
        progress: &dyn ProgressCallback,
    ) -> ScanOutcome {
        let start_time = Instant::now();
        let reporter = ProgressReporter::new(progress);
        let mut summary = ScanSummary::default();

        // Stage 1: size buckets
        let roots = effective_roots(roots);
        summary.roots_scanned = roots.len();
        log::info!("Starting duplicate scan of {} root(s)", roots.len());

        let Some(size_groups) = self.scan(&roots, token, &reporter) else {
            log::info!("Duplicate scan cancelled while scanning");
            return ScanOutcome::Cancelled;
        };

        let stats = size_groups.stats();
        summary.absorb_grouping(&stats);
        log::info!(
            "Size grouping: {} files, {} potential duplicates ({:.1}% eliminated)",
            stats.total_files,
            stats.potential_duplicates,
            stats.elimination_rate()
        );
        reporter.status(&format!(
            "Found {} files, checking for duplicates...",
            stats.total_files
        ));

        if stats.potential_duplicates == 0 {
            log::info!("No potential duplicates found");
            summary.scan_duration = start_time.elapsed();
            reporter.finish();
            return ScanOutcome::Completed(DuplicateReport {
                summary,
                ..DuplicateReport::default()
            });
        }

        // Stage 2: content hashes
        reporter.status(&format!(
            "Checking {} potential duplicates...",
            stats.potential_duplicates
        ));
        let Some((hash_groups, failures)) =
            self.hash_candidates(size_groups, stats.potential_duplicates, token, &reporter)
        else {
            log::info!("Duplicate scan cancelled while hashing");
            return ScanOutcome::Cancelled;
        };
        summary.hash_failures = failures;

        // Stage 3: assembly
        let Some(groups) = assemble(hash_groups, token) else {
            log::info!("Duplicate scan cancelled while assembling groups");
            return ScanOutcome::Cancelled;
        };

        let total_wasted: u64 = groups.iter().map(|g| g.wasted_bytes).sum();
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = total_wasted;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Found {} duplicate groups with {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        reporter.finish();
        ScanOutcome::Completed(DuplicateReport {
            groups,
            total_wasted,
            summary,
        })
    }

    /// Walk all roots into size buckets. `None` if cancelled.
    fn scan(
        &self,
        roots: &[PathBuf],
        token: &CancellationToken,
        reporter: &ProgressReporter<'_>,
    ) -> Option<SizeGroups> {
        reporter.status("Scanning files...");

        let status_interval = self.config.status_interval.max(1);
        let walker_config = WalkerConfig {
            skip_hidden: self.config.skip_hidden,
            max_depth: None,
        };
        let mut groups = SizeGroups::new();
        let mut scanned = 0usize;

        for root in roots {
            if token.is_cancelled() {
                return None;
            }
            log::debug!("Scanning root: {}", root.display());

            for entry in Walker::new(root, walker_config.clone()).walk(token) {
                if !entry.is_file() {
                    continue;
                }
                if entry.size < self.config.min_size {
                    log::trace!("Below minimum size: {}", entry.path.display());
                    continue;
                }

                groups.push(entry.size, entry.path);
                scanned += 1;
                if scanned % status_interval == 0 {
                    reporter.status(&format!("Scanned {} files...", scanned));
                }
            }
        }

        if token.is_cancelled() {
            return None;
        }
        Some(groups)
    }

    /// Hash every member of a multi-file size bucket. `None` if cancelled.
    fn hash_candidates(
        &self,
        size_groups: SizeGroups,
        potential: usize,
        token: &CancellationToken,
        reporter: &ProgressReporter<'_>,
    ) -> Option<(Vec<(u64, HashGroups)>, usize)> {
        let hasher = Hasher::new()
            .with_chunk_size(self.config.chunk_size)
            .with_cancellation(token.clone());
        let progress_interval = self.config.progress_interval.max(1);

        let mut buckets = Vec::new();
        let mut processed = 0usize;
        let mut failures = 0usize;

        for (size, paths) in size_groups.into_candidates() {
            log::debug!("Hashing {} files of {} bytes", paths.len(), size);
            let mut by_hash = HashGroups::new();

            for path in paths {
                if token.is_cancelled() {
                    return None;
                }

                match hasher.hash_file(&path) {
                    Ok(hash) => by_hash.push(hash, path),
                    Err(HashError::Cancelled(_)) => return None,
                    Err(e) => {
                        log::debug!("Dropping unreadable file: {}", e);
                        failures += 1;
                    }
                }

                processed += 1;
                if processed % progress_interval == 0 {
                    reporter.report_fraction(processed, potential);
                }
            }

            buckets.push((size, by_hash));
        }

        Some((buckets, failures))
    }
}

/// Build the final groups, oldest file first. `None` if cancelled.
fn assemble(
    buckets: Vec<(u64, HashGroups)>,
    token: &CancellationToken,
) -> Option<Vec<DuplicateGroup>> {
    let mut groups = Vec::new();
    for (size, by_hash) in buckets {
        for (hash, paths) in by_hash.into_candidates() {
            if token.is_cancelled() {
                return None;
            }
            groups.push(DuplicateGroup::new(hash, size, order_by_mtime(paths)));
        }
    }
    Some(groups)
}

/// Normalize roots, skipping missing ones and any root nested inside another.
///
/// The first occurrence of a root wins; order is otherwise preserved.
#[must_use]
pub fn effective_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::new();

    for root in roots {
        let normalized = path_utils::lexical_normalize(&path_utils::absolutize(root));
        if !normalized.is_dir() {
            log::warn!("Skipping root that is not an accessible directory: {}", root.display());
            continue;
        }
        if kept.iter().any(|k| path_utils::is_same_or_within(&normalized, k)) {
            log::info!("Skipping root nested in another root: {}", root.display());
            continue;
        }
        kept.retain(|k| {
            let nested = path_utils::is_same_or_within(k, &normalized);
            if nested {
                log::info!("Skipping root nested in another root: {}", k.display());
            }
            !nested
        });
        kept.push(normalized);
    }

    kept
}

/// Convenience wrapper for a single root.
pub fn find_duplicates_in(
    root: &Path,
    config: FinderConfig,
    token: &CancellationToken,
    progress: &dyn ProgressCallback,
) -> ScanOutcome {
    DuplicateFinder::new(config).find_duplicates(&[root.to_path_buf()], token, progress)
}
