//! Command execution for the `proview` binary.
//!
//! Every long-running subcommand goes through the [`Scheduler`]: the main
//! thread starts a task, hands its token to the Ctrl+C handler, and pumps
//! the task's events into a [`ConsoleProgress`] bar until `Finished`.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::delete::{self, BatchDeleteResult};
use crate::actions::transfer::{FileOperationResult, OperationKind};
use crate::cancel::CancellationToken;
use crate::cli::{Cli, Commands, DrivesArgs, DupesArgs, OutputFormat, SearchArgs, TransferArgs};
use crate::config::Config;
use crate::drives;
use crate::duplicates::DuplicateReport;
use crate::error::ExitCode;
use crate::logging;
use crate::output::{write_json, CsvOutput, JsonFileOperation, JsonReport, JsonSearch};
use crate::progress::{ConsoleProgress, ProgressCallback};
use crate::search::SearchOutcome;
use crate::signal::{self, InterruptHandler};
use crate::tasks::{Scheduler, TaskEvent, TaskHandle};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the parsed command line.
///
/// # Errors
///
/// Returns an error for bad configuration, an invalid copy/move
/// destination, or failed output.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    let interrupt = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{}", e);
        InterruptHandler::new()
    });

    let app = App {
        scheduler: Scheduler::new(config.workers)
            .context("failed to start worker pool")?
            .with_search_config(config.search.clone())
            .with_finder_config(config.duplicates.clone()),
        interrupt,
        config,
        quiet: cli.quiet,
    };

    match &cli.command {
        Commands::Search(args) => app.search(args),
        Commands::Dupes(args) => app.dupes(args),
        Commands::Copy(args) => app.transfer(args, OperationKind::Copy),
        Commands::Move(args) => app.transfer(args, OperationKind::Move),
        Commands::Drives(args) => app.drives(args),
    }
}

struct App {
    scheduler: Scheduler,
    interrupt: InterruptHandler,
    config: Config,
    quiet: bool,
}

/// Non-progress events of one finished task.
#[derive(Debug, Default)]
struct Collected {
    search: Option<SearchOutcome>,
    report: Option<DuplicateReport>,
    file_op: Option<FileOperationResult>,
    error: Option<(String, String)>,
}

impl App {
    fn progress(&self, label: &str, format: OutputFormat) -> ConsoleProgress {
        ConsoleProgress::new(label, self.quiet || format != OutputFormat::Text)
    }

    /// Pump events of `handle` until it finishes.
    fn wait(&self, handle: &TaskHandle, progress: &ConsoleProgress) -> Collected {
        self.interrupt.watch(handle.token().clone());
        let mut collected = Collected::default();

        loop {
            let Some(event) = self.scheduler.next_event(handle, POLL_INTERVAL) else {
                continue;
            };
            match event {
                TaskEvent::Progress(percent) => progress.on_progress(percent),
                TaskEvent::Status(message) => progress.on_message(&message),
                TaskEvent::SearchMatches(outcome) => collected.search = Some(outcome),
                TaskEvent::DuplicateResult(report) => collected.report = Some(report),
                TaskEvent::FileOperationResult(result) => collected.file_op = Some(result),
                TaskEvent::Error { title, message } => collected.error = Some((title, message)),
                TaskEvent::Finished => break,
            }
        }

        progress.clear();
        collected
    }

    fn search(&self, args: &SearchArgs) -> Result<ExitCode> {
        let progress = self.progress("Searching", args.output);
        let handle = self
            .scheduler
            .start_search(args.root.clone(), args.query.clone());
        let outcome = self.wait(&handle, &progress).search.unwrap_or_default();

        let mut stdout = io::stdout().lock();
        match args.output {
            OutputFormat::Json => {
                write_json(&JsonSearch::new(&args.root, &args.query, &outcome), &mut stdout, true)?;
            }
            _ => {
                for path in &outcome.matches {
                    writeln!(stdout, "{}", path.display())?;
                }
                if !self.quiet {
                    eprintln!("{}", search_summary(&outcome));
                }
            }
        }

        Ok(if outcome.cancelled || self.interrupt.was_interrupted() {
            ExitCode::Interrupted
        } else if outcome.matches.is_empty() {
            ExitCode::NothingFound
        } else {
            ExitCode::Success
        })
    }

    fn dupes(&self, args: &DupesArgs) -> Result<ExitCode> {
        let roots = if args.all_drives {
            drives::drive_roots()
        } else {
            args.roots.clone()
        };
        if roots.is_empty() {
            bail!("no drives found to scan");
        }

        let progress = self.progress("Scanning", args.output);
        let handle = self
            .scheduler
            .start_duplicate_scan(roots, self.config.duplicates.min_size);
        let Some(report) = self.wait(&handle, &progress).report else {
            if !self.quiet {
                eprintln!("{}", "Scan cancelled.".yellow());
            }
            return Ok(ExitCode::Interrupted);
        };

        let exit_code = if report.is_empty() {
            ExitCode::NothingFound
        } else {
            ExitCode::Success
        };

        let mut stdout = io::stdout().lock();
        match args.output {
            OutputFormat::Json => {
                write_json(&JsonReport::new(&report, exit_code), &mut stdout, true)?;
            }
            OutputFormat::Csv => CsvOutput::new(&report.groups).write_to(&mut stdout)?,
            OutputFormat::Text => {
                write_report_text(&mut stdout, &report)?;
            }
        }
        drop(stdout);

        if args.delete && !report.is_empty() {
            return self.delete_duplicates(&report, args.yes);
        }
        Ok(exit_code)
    }

    fn delete_duplicates(&self, report: &DuplicateReport, assume_yes: bool) -> Result<ExitCode> {
        let selection = delete::select_duplicates(&report.groups);
        delete::validate_selection(&selection, &report.groups)?;

        let permanent = self.config.delete.permanent;
        if !assume_yes {
            let stdin = io::stdin();
            let confirmed = confirm_deletion(
                &mut stdin.lock(),
                &mut io::stderr(),
                selection.len(),
                report.total_wasted,
                permanent,
            )?;
            if !confirmed {
                eprintln!("Deletion skipped.");
                return Ok(ExitCode::Success);
            }
        }

        let token = CancellationToken::new();
        self.interrupt.watch(token.clone());
        let progress = ConsoleProgress::new("Deleting", self.quiet);
        let result = delete::delete_batch(&selection, &self.config.delete, &token, &progress);
        progress.clear();

        if !self.quiet {
            write_delete_text(&mut io::stderr(), &result)?;
        }

        Ok(if result.cancelled {
            ExitCode::Interrupted
        } else {
            ExitCode::for_batch(result.success_count(), result.failure_count())
        })
    }

    fn transfer(&self, args: &TransferArgs, kind: OperationKind) -> Result<ExitCode> {
        let label = match kind {
            OperationKind::Copy => "Copying",
            OperationKind::Move => "Moving",
        };
        let progress = self.progress(label, args.output);
        let handle = self.scheduler.start_file_operation(
            args.sources.clone(),
            args.destination.clone(),
            kind,
        );
        let collected = self.wait(&handle, &progress);

        if let Some((title, message)) = collected.error {
            bail!("{title}: {message} ({})", args.destination.display());
        }
        let Some(result) = collected.file_op else {
            bail!("{} finished without a result", kind.error_title());
        };

        match args.output {
            OutputFormat::Json => {
                write_json(&JsonFileOperation::from(&result), &mut io::stdout().lock(), true)?;
            }
            _ => write_transfer_text(&mut io::stdout().lock(), &result)?,
        }

        Ok(if result.cancelled {
            ExitCode::Interrupted
        } else {
            ExitCode::for_batch(result.success_count, result.errors.len())
        })
    }

    fn drives(&self, args: &DrivesArgs) -> Result<ExitCode> {
        let drives = drives::list_drives();
        let mut stdout = io::stdout().lock();

        match args.output {
            OutputFormat::Json => write_json(&drives, &mut stdout, true)?,
            _ => {
                for drive in &drives {
                    writeln!(
                        stdout,
                        "{}  {}",
                        drive.label().bold(),
                        drive.space_display().dim()
                    )?;
                }
            }
        }

        Ok(if drives.is_empty() {
            ExitCode::NothingFound
        } else {
            ExitCode::Success
        })
    }
}

fn search_summary(outcome: &SearchOutcome) -> String {
    let mut text = format!(
        "{} match(es) in {} folder(s)",
        outcome.matches.len(),
        outcome.dirs_visited
    );
    if outcome.limit_reached {
        text.push_str(", search limit reached");
    }
    if outcome.cancelled {
        text.push_str(", cancelled");
    }
    text
}

/// Print groups, original first, and a totals line.
fn write_report_text<W: Write>(out: &mut W, report: &DuplicateReport) -> io::Result<()> {
    if report.is_empty() {
        writeln!(out, "{}", "No duplicates found.".green())?;
        return Ok(());
    }

    for (idx, group) in report.groups.iter().enumerate() {
        writeln!(
            out,
            "{} {} x {} ({} wasted)",
            format!("Group {}:", idx + 1).bold(),
            group.count,
            ByteSize::b(group.size),
            ByteSize::b(group.wasted_bytes)
        )?;
        for (position, path) in group.files.iter().enumerate() {
            let marker = if position == 0 { "keep" } else { "dup " };
            writeln!(out, "  {} {}", marker.dim(), path.display())?;
        }
    }

    let summary = &report.summary;
    writeln!(
        out,
        "{} duplicate file(s) in {} group(s), {} reclaimable ({:.1}% of {} scanned)",
        report.duplicate_files(),
        report.groups.len(),
        summary.reclaimable_display().yellow().bold(),
        summary.wasted_percentage(),
        summary.total_size_display()
    )
}

fn write_transfer_text<W: Write>(out: &mut W, result: &FileOperationResult) -> io::Result<()> {
    for error in &result.errors {
        writeln!(out, "{} {}", "error:".red().bold(), error)?;
    }
    let summary = result.summary();
    if result.all_succeeded() {
        writeln!(out, "{}", summary.green())
    } else {
        writeln!(out, "{}", summary.yellow())
    }
}

fn write_delete_text<W: Write>(out: &mut W, result: &BatchDeleteResult) -> io::Result<()> {
    for (path, message) in &result.failures {
        writeln!(out, "{} {}: {}", "error:".red().bold(), path.display(), message)?;
    }
    writeln!(out, "{}", result.summary())
}

/// Ask before deleting. Anything but `y`/`yes` declines.
fn confirm_deletion<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    count: usize,
    bytes: u64,
    permanent: bool,
) -> io::Result<bool> {
    let target = if permanent {
        "PERMANENTLY delete"
    } else {
        "move to trash"
    };
    write!(
        output,
        "{} {} duplicate file(s) ({})? [y/N] ",
        target,
        count,
        ByteSize::b(bytes)
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
