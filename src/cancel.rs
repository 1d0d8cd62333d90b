//! Cooperative cancellation.
//!
//! A [`CancellationToken`] wraps an `AtomicBool` shared between the code that
//! requests cancellation (the scheduler, a Ctrl+C handler) and the engine
//! that polls it. Requesting cancellation never blocks; the engine notices
//! at its next poll point and winds down on its own.
//!
//! # Example
//!
//! ```
//! use proview::cancel::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let worker_view = token.clone();
//!
//! assert!(!worker_view.is_cancelled());
//! token.cancel();
//! assert!(worker_view.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, thread-safe cancellation flag.
///
/// Clones share the same underlying flag. The flag only ever goes from
/// `false` to `true`; cancelling twice is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call flipped the flag, `false` if the token
    /// was already cancelled.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Check whether two tokens share the same flag.
    #[must_use]
    pub fn same_token(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.flag, &other.flag)
    }
}
