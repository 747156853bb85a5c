//! Cooperative cancellation signal.

use crate::error::{PersistenceError, PersistenceResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag shared between an invoker and the
/// operation it drives.
///
/// Cancellation is cooperative: nothing is interrupted, the flag is only
/// observed at well-defined points (before `begin`, after the business body,
/// between availability retries).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`PersistenceError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> PersistenceResult<()> {
        if self.is_cancelled() {
            Err(PersistenceError::Cancelled)
        } else {
            Ok(())
        }
    }
}
