//! Grouping structures for the duplicate pipeline.
//!
//! # Overview
//!
//! Files are bucketed twice: first by exact size, then by content hash.
//! Both buckets are [`OrderedGroups`], which remember the order in which
//! each key was first seen. That keeps reports stable across runs on the
//! same tree, since walk order is itself deterministic.
//!
//! Files with different sizes cannot be duplicates, so only size buckets
//! with two or more members are ever hashed.
//!
//! # Example
//!
//! ```
//! use proview::duplicates::SizeGroups;
//! use std::path::PathBuf;
//!
//! let mut groups = SizeGroups::new();
//! groups.push(1024, PathBuf::from("/a.txt"));
//! groups.push(2048, PathBuf::from("/b.txt"));
//! groups.push(1024, PathBuf::from("/c.txt"));
//!
//! let stats = groups.stats();
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.candidates().count(), 1);
//! ```

use std::collections::HashMap;
use std::hash::Hash as StdHash;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::scanner::Hash;

/// Key-to-paths map that iterates in first-insertion order of its keys.
#[derive(Debug, Clone)]
pub struct OrderedGroups<K> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<PathBuf>)>,
}

impl<K> Default for OrderedGroups<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<K: StdHash + Eq + Copy> OrderedGroups<K> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the bucket for `key`.
    pub fn push(&mut self, key: K, path: PathBuf) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(path),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push((key, vec![path]));
            }
        }
    }

    /// Paths stored under `key`, in insertion order.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&[PathBuf]> {
        self.index
            .get(key)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if nothing has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of paths across all buckets.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.groups.iter().map(|(_, paths)| paths.len()).sum()
    }

    /// All buckets in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[PathBuf])> + '_ {
        self.groups
            .iter()
            .map(|(key, paths)| (*key, paths.as_slice()))
    }

    /// Buckets with two or more members, in first-insertion order.
    pub fn candidates(&self) -> impl Iterator<Item = (K, &[PathBuf])> + '_ {
        self.iter().filter(|(_, paths)| paths.len() > 1)
    }

    /// Consume the map, yielding buckets with two or more members.
    pub fn into_candidates(self) -> impl Iterator<Item = (K, Vec<PathBuf>)> {
        self.groups.into_iter().filter(|(_, paths)| paths.len() > 1)
    }
}

/// Files bucketed by exact size in bytes.
pub type SizeGroups = OrderedGroups<u64>;

/// Files bucketed by content digest.
pub type HashGroups = OrderedGroups<Hash>;

impl SizeGroups {
    /// Summarize the size bucketing.
    #[must_use]
    pub fn stats(&self) -> GroupingStats {
        let mut stats = GroupingStats {
            unique_sizes: self.len(),
            ..GroupingStats::default()
        };
        for (size, paths) in self.iter() {
            stats.total_files += paths.len();
            stats.total_size += size * paths.len() as u64;
            if paths.len() > 1 {
                stats.potential_duplicates += paths.len();
                stats.duplicate_groups += 1;
            } else {
                stats.eliminated_unique += 1;
            }
        }
        stats
    }
}

/// Statistics from the size bucketing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files bucketed
    pub total_files: usize,
    /// Total size of all bucketed files in bytes
    pub total_size: u64,
    /// Number of distinct sizes
    pub unique_sizes: usize,
    /// Number of files sharing their size with at least one other file
    pub potential_duplicates: usize,
    /// Number of files eliminated because their size is unique
    pub eliminated_unique: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Confirmed group of files with identical content.
///
/// `files[0]` is the original to keep; the rest are the duplicates.
/// Built once by the finder and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the file content (32 bytes)
    pub hash: Hash,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Member paths, oldest modification time first
    pub files: Vec<PathBuf>,
    /// Number of members
    pub count: usize,
    /// Bytes that removing every duplicate would free: `size * (count - 1)`
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Create a group. `count` and `wasted_bytes` are derived from `files`.
    #[must_use]
    pub fn new(hash: Hash, size: u64, files: Vec<PathBuf>) -> Self {
        let count = files.len();
        let wasted_bytes = size.saturating_mul(count.saturating_sub(1) as u64);
        Self {
            hash,
            size,
            files,
            count,
            wasted_bytes,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The member to keep.
    #[must_use]
    pub fn original(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    /// Every member except the original.
    #[must_use]
    pub fn duplicates(&self) -> &[PathBuf] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.count.saturating_sub(1)
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size.saturating_mul(self.count as u64)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        crate::scanner::hash_to_hex(&self.hash)
    }
}

/// Order paths by modification time, oldest first.
///
/// The sort is stable, so files with equal timestamps keep discovery order.
/// If any member's timestamp cannot be read, the input order is returned
/// untouched.
#[must_use]
pub fn order_by_mtime(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let stamped: Option<Vec<(SystemTime, PathBuf)>> = paths
        .iter()
        .map(|p| {
            std::fs::metadata(p)
                .and_then(|m| m.modified())
                .ok()
                .map(|t| (t, p.clone()))
        })
        .collect();

    match stamped {
        Some(mut stamped) => {
            stamped.sort_by_key(|(time, _)| *time);
            stamped.into_iter().map(|(_, path)| path).collect()
        }
        None => {
            log::debug!(
                "Unreadable modification time in group of {}, keeping discovery order",
                paths.len()
            );
            paths
        }
    }
}
