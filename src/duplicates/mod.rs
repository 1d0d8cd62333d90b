//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (stage 1)
//! - Full content hashing of same-size files (stage 2)
//! - Duplicate group assembly, oldest file first (stage 3)

pub mod finder;
pub mod groups;

pub use finder::{
    effective_roots, find_duplicates_in, DuplicateFinder, DuplicateReport, FinderConfig,
    ScanOutcome, ScanSummary,
};
pub use groups::{
    order_by_mtime, DuplicateGroup, GroupingStats, HashGroups, OrderedGroups, SizeGroups,
};
