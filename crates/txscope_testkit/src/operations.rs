//! Operations for driving decorator chains in tests.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use txscope_core::{CancellationToken, Operation, OperationScope, PersistenceError, PersistenceResult};

/// Lifecycle phase of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `begin` was called.
    Begin,
    /// `complete` was called.
    Complete,
    /// `cancel` was called.
    Cancel,
}

/// Innermost operation recording the phases it is driven through.
///
/// Clones share the record, so a test can keep one clone while the chain
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingOperation {
    calls: Arc<Mutex<Vec<Phase>>>,
    saw_transaction: Arc<AtomicBool>,
    fail_on: Option<Phase>,
}

impl RecordingOperation {
    /// Creates an operation that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an operation that fails in `phase` with a business error.
    pub fn failing_on(phase: Phase) -> Self {
        Self {
            fail_on: Some(phase),
            ..Self::default()
        }
    }

    /// Phases seen so far.
    pub fn calls(&self) -> Vec<Phase> {
        self.calls.lock().clone()
    }

    /// True if a current transaction was visible during `begin`.
    pub fn saw_transaction(&self) -> bool {
        self.saw_transaction.load(Ordering::SeqCst)
    }

    fn record(&self, phase: Phase) -> PersistenceResult<()> {
        self.calls.lock().push(phase);
        if self.fail_on == Some(phase) {
            return Err(business_failure(format!("{phase:?} failed")));
        }
        Ok(())
    }
}

impl Operation for RecordingOperation {
    fn begin(
        &mut self,
        scope: &OperationScope,
        _cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        self.saw_transaction
            .store(scope.transaction().has_current(), Ordering::SeqCst);
        self.record(Phase::Begin)
    }

    fn complete(&mut self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        self.record(Phase::Complete)
    }

    fn cancel(&mut self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        self.record(Phase::Cancel)
    }
}

/// Error standing in for a failure of business logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BusinessFailure(pub String);

/// Wraps a [`BusinessFailure`] into a core error.
pub fn business_failure(message: impl Into<String>) -> PersistenceError {
    PersistenceError::operation(BusinessFailure(message.into()))
}

/// Returns the business failure carried by `error`, if any.
pub fn as_business_failure(error: &PersistenceError) -> Option<&BusinessFailure> {
    match error {
        PersistenceError::Operation(source) => source.downcast_ref::<BusinessFailure>(),
        _ => None,
    }
}
