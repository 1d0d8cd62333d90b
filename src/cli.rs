//! Command-line interface definitions.
//!
//! ```bash
//! # Find files and folders whose name contains "invoice"
//! proview search ~/Documents invoice
//!
//! # Duplicate scan of two folders, ignoring files under 1 MiB
//! proview dupes ~/Pictures ~/Backup --min-size 1MiB
//!
//! # Move duplicates to the trash without asking
//! proview dupes ~/Downloads --delete -y
//!
//! # Copy two items into a folder, JSON result
//! proview copy a.txt photos/ --to /mnt/usb --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

use crate::actions::transfer::OperationKind;
use crate::config::Overrides;

/// File search, duplicate detection and bulk copy/move with progress and
/// cancellation.
#[derive(Debug, Parser)]
#[command(name = "proview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of worker threads (0 = one per CPU)
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find files and directories by name (case-insensitive substring)
    Search(SearchArgs),
    /// Find duplicate files by content
    Dupes(DupesArgs),
    /// Copy files and directories into a destination directory
    Copy(TransferArgs),
    /// Move files and directories into a destination directory
    Move(TransferArgs),
    /// List mounted drives
    Drives(DrivesArgs),
}

/// Arguments for `search`.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Directory to search
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Text to look for in entry names (at least 2 characters)
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Stop after this many matches
    #[arg(long, value_name = "N")]
    pub max_matches: Option<usize>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for `dupes`.
#[derive(Debug, Args)]
pub struct DupesArgs {
    /// Directories to scan (nested and missing ones are ignored)
    #[arg(value_name = "ROOTS", required_unless_present = "all_drives")]
    pub roots: Vec<PathBuf>,

    /// Scan every mounted drive
    #[arg(long, conflicts_with = "roots")]
    pub all_drives: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Output format (csv is only available for this command)
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Delete every duplicate, keeping the oldest file of each group
    #[arg(long)]
    pub delete: bool,

    /// Delete permanently instead of moving to the trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long, requires = "delete")]
    pub permanent: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long, requires = "delete")]
    pub yes: bool,
}

/// Arguments for `copy` and `move`.
#[derive(Debug, Args)]
pub struct TransferArgs {
    /// Files and directories to transfer
    #[arg(value_name = "SOURCES", required = true)]
    pub sources: Vec<PathBuf>,

    /// Destination directory (must exist)
    #[arg(long = "to", short = 't', value_name = "DEST")]
    pub destination: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for `drives`.
#[derive(Debug, Args)]
pub struct DrivesArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
    /// CSV for spreadsheets (duplicate reports only)
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl Commands {
    /// The operation kind for `copy`/`move`.
    #[must_use]
    pub fn operation_kind(&self) -> Option<OperationKind> {
        match self {
            Self::Copy(_) => Some(OperationKind::Copy),
            Self::Move(_) => Some(OperationKind::Move),
            _ => None,
        }
    }
}

impl Cli {
    /// Configuration values set by these flags.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            workers: self.workers,
            ..Overrides::default()
        };
        match &self.command {
            Commands::Search(args) => {
                overrides.max_matches = args.max_matches;
                overrides.skip_hidden = args.skip_hidden.then_some(true);
            }
            Commands::Dupes(args) => {
                overrides.min_size = args.min_size;
                overrides.skip_hidden = args.skip_hidden.then_some(true);
                overrides.permanent = args.permanent.then_some(true);
            }
            Commands::Copy(_) | Commands::Move(_) | Commands::Drives(_) => {}
        }
        overrides
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB.
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// ```
/// use proview::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    let suffix = suffix.trim().to_ascii_uppercase();

    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid number: '{number}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "KIB" => 1 << 10,
        "M" | "MB" => 1_000_000,
        "MIB" => 1 << 20,
        "G" | "GB" => 1_000_000_000,
        "GIB" => 1 << 30,
        "T" | "TB" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((value * multiplier as f64) as u64)
}
