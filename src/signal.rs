//! Ctrl+C handling for the command-line front end.
//!
//! The process-wide handler is installed once and forwards the interrupt to
//! whichever task the CLI is currently waiting on. The task is registered
//! through [`InterruptHandler::watch`]; the handler itself only flips the
//! registered task's [`CancellationToken`].
//!
//! # Exit Codes
//!
//! An interrupted run exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::cancel::CancellationToken;

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Forwards Ctrl+C to the task currently being watched.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandler {
    watched: Arc<Mutex<Option<CancellationToken>>>,
    interrupted: Arc<AtomicBool>,
}

impl InterruptHandler {
    /// Create a handler that is not yet hooked to any signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the token of the task that an interrupt should cancel.
    ///
    /// If an interrupt already arrived, the token is cancelled right away.
    pub fn watch(&self, token: CancellationToken) {
        if self.was_interrupted() {
            token.cancel();
        }
        if let Ok(mut slot) = self.watched.lock() {
            *slot = Some(token);
        }
    }

    /// Record an interrupt and cancel the watched task, if any.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        if let Ok(slot) = self.watched.lock() {
            if let Some(token) = slot.as_ref() {
                token.cancel();
            }
        }
    }

    /// Whether an interrupt has been received.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<InterruptHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// Calling this more than once returns the handler installed first. If
/// another component already owns the signal hook, an unhooked handler is
/// returned; it still works for manual [`InterruptHandler::interrupt`] calls.
///
/// # Errors
///
/// Never fails in practice; the `Result` is kept so callers can surface a
/// future installation failure without an API change.
pub fn install_handler() -> Result<InterruptHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        return Ok(handler.clone());
    }

    let handler = InterruptHandler::new();
    let hooked = handler.clone();

    match ctrlc::set_handler(move || {
        hooked.interrupt();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cancelling...");
        let _ = std::io::stderr().flush();
        log::info!("Interrupt received, cancelling running task");
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(GLOBAL_HANDLER.get().cloned().unwrap_or(handler))
        }
        Err(e) => {
            log::debug!("Ctrl+C handler unavailable ({}), using unhooked handler", e);
            let fallback = InterruptHandler::new();
            let _ = GLOBAL_HANDLER.set(fallback.clone());
            Ok(GLOBAL_HANDLER.get().cloned().unwrap_or(fallback))
        }
    }
}
