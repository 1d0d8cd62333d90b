//! ProView - background filesystem tasks
//!
//! File-name search, duplicate detection (size bucketing, then BLAKE3
//! hashing) and bulk copy/move, each run off the caller's thread with
//! incremental progress and cooperative cancellation.

pub mod actions;
pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod drives;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod search;
pub mod signal;
pub mod tasks;

pub use app::run_app;
