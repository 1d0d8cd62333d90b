//! Progress reporting for background tasks.
//!
//! Engines report through the [`ProgressCallback`] trait. Internally they wrap
//! the callback in a [`ProgressReporter`], which clamps percentages to 100 and
//! drops values that would move the bar backwards, so every listener sees a
//! non-decreasing sequence for one task instance.
//!
//! [`ConsoleProgress`] renders the same events as an `indicatif` bar for the
//! command-line front end.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver of progress updates from a running engine.
///
/// Implementations must be cheap; engines call these from their hot loop.
pub trait ProgressCallback: Send + Sync {
    /// Called with the overall completion percentage (0-100).
    fn on_progress(&self, percent: u8);

    /// Called with free-form status text, e.g. `"Scanned 50 files..."`.
    fn on_message(&self, _message: &str) {}
}

/// Callback that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_progress(&self, _percent: u8) {}
}

/// Enforces the ordering rules on top of a raw callback.
///
/// One reporter belongs to one task instance.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressCallback,
    last: AtomicU8,
    reported_any: AtomicBool,
}

impl<'a> ProgressReporter<'a> {
    /// Wrap a callback.
    #[must_use]
    pub fn new(sink: &'a dyn ProgressCallback) -> Self {
        Self {
            sink,
            last: AtomicU8::new(0),
            reported_any: AtomicBool::new(false),
        }
    }

    /// Report a percentage. Values above 100 are clamped; values lower than
    /// the last reported one are dropped.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last.load(Ordering::SeqCst);
        if self.reported_any.load(Ordering::SeqCst) && percent < previous {
            log::trace!("Dropping regressing progress {} < {}", percent, previous);
            return;
        }
        self.last.store(percent, Ordering::SeqCst);
        self.reported_any.store(true, Ordering::SeqCst);
        self.sink.on_progress(percent);
    }

    /// Report `done / total` as a percentage.
    ///
    /// A zero `total` counts as complete.
    pub fn report_fraction(&self, done: usize, total: usize) {
        self.report(percent_of(done, total));
    }

    /// Forward status text unchanged.
    pub fn status(&self, message: &str) {
        self.sink.on_message(message);
    }

    /// Report 100%.
    pub fn finish(&self) {
        self.report(100);
    }

    /// Last percentage that reached the sink, if any.
    #[must_use]
    pub fn last(&self) -> Option<u8> {
        self.reported_any
            .load(Ordering::SeqCst)
            .then(|| self.last.load(Ordering::SeqCst))
    }
}

/// Integer percentage of `done` out of `total`, saturating at 100.
#[must_use]
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (done as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Terminal progress bar built on indicatif.
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl ConsoleProgress {
    /// Create a renderer. A quiet renderer draws nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use proview::progress::{ConsoleProgress, ProgressCallback};
    ///
    /// let progress = ConsoleProgress::new("Searching", true);
    /// progress.on_progress(50);
    /// progress.finish();
    /// ```
    #[must_use]
    pub fn new(label: &str, quiet: bool) -> Self {
        let bar = if quiet {
            None
        } else {
            let pb = ProgressBar::new(100);
            pb.set_style(Self::style());
            pb.set_prefix(label.to_string());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        };
        Self {
            bar: Mutex::new(bar),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} {prefix:.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// Whether this renderer draws nothing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Stop the bar and leave it on screen.
    pub fn finish(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(pb) = bar.take() {
                pb.finish();
            }
        }
    }

    /// Stop the bar and remove it from the screen.
    pub fn clear(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(pb) = bar.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, percent: u8) {
        if let Ok(bar) = self.bar.lock() {
            if let Some(pb) = bar.as_ref() {
                pb.set_position(u64::from(percent));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if let Ok(bar) = self.bar.lock() {
            if let Some(pb) = bar.as_ref() {
                pb.set_message(message.to_string());
            }
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.clear();
    }
}
