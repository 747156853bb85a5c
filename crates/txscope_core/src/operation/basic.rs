//! Innermost operation.

use crate::cancellation::CancellationToken;
use crate::error::{PersistenceError, PersistenceResult};
use crate::operation::Operation;
use crate::scope::OperationScope;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

static NEXT_OPERATION_NUMBER: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a [`BasicOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Not begun yet.
    Initial,
    /// Begun, waiting for `complete` or `cancel`.
    Active,
    /// Completed successfully.
    Completed,
    /// Cancelled.
    Cancelled,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "initial",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// The undecorated lifecycle of a unit of work.
///
/// Carries a process-wide operation number for log correlation and guards
/// its own transitions.
#[derive(Debug)]
pub struct BasicOperation {
    number: u64,
    state: OperationState,
    started: Option<Instant>,
}

impl BasicOperation {
    /// Creates a new operation in the initial state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            number: NEXT_OPERATION_NUMBER.fetch_add(1, Ordering::Relaxed),
            state: OperationState::Initial,
            started: None,
        }
    }

    /// Returns the operation number.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> OperationState {
        self.state
    }

    fn elapsed_ms(&self) -> u128 {
        self.started.map_or(0, |t| t.elapsed().as_millis())
    }
}

impl Default for BasicOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for BasicOperation {
    fn begin(
        &mut self,
        scope: &OperationScope,
        _cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        if self.state != OperationState::Initial {
            return Err(PersistenceError::state_violation(format!(
                "operation #{} cannot begin when it is {}",
                self.number, self.state
            )));
        }
        debug!(operation = self.number, scope = %scope.id(), "Beginning operation");
        self.started = Some(Instant::now());
        self.state = OperationState::Active;
        Ok(())
    }

    fn complete(&mut self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        if self.state != OperationState::Active {
            return Err(PersistenceError::state_violation(format!(
                "operation #{} cannot complete when it is {}",
                self.number, self.state
            )));
        }
        self.state = OperationState::Completed;
        debug!(
            operation = self.number,
            elapsed_ms = self.elapsed_ms(),
            "Operation completed"
        );
        Ok(())
    }

    fn cancel(&mut self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        match self.state {
            OperationState::Initial | OperationState::Active => {
                self.state = OperationState::Cancelled;
                info!(
                    operation = self.number,
                    elapsed_ms = self.elapsed_ms(),
                    "Operation cancelled"
                );
                Ok(())
            }
            other => Err(PersistenceError::state_violation(format!(
                "operation #{} cannot be cancelled when it is {}",
                self.number, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_increase() {
        let a = BasicOperation::new();
        let b = BasicOperation::new();
        assert!(b.number() > a.number());
    }

    #[test]
    fn begin_complete() {
        let scope = OperationScope::new();
        let token = CancellationToken::new();
        let mut op = BasicOperation::new();

        op.begin(&scope, &token).unwrap();
        assert_eq!(op.state(), OperationState::Active);
        op.complete(&token).unwrap();
        assert_eq!(op.state(), OperationState::Completed);
    }

    #[test]
    fn begin_twice_fails() {
        let scope = OperationScope::new();
        let token = CancellationToken::new();
        let mut op = BasicOperation::new();

        op.begin(&scope, &token).unwrap();
        assert!(op.begin(&scope, &token).unwrap_err().is_state_violation());
    }

    #[test]
    fn complete_without_begin_fails() {
        let token = CancellationToken::new();
        let mut op = BasicOperation::new();
        assert!(op.complete(&token).unwrap_err().is_state_violation());
    }

    #[test]
    fn cancel_before_begin_is_allowed() {
        let token = CancellationToken::new();
        let mut op = BasicOperation::new();
        op.cancel(&token).unwrap();
        assert_eq!(op.state(), OperationState::Cancelled);
    }

    #[test]
    fn cancel_after_complete_fails() {
        let scope = OperationScope::new();
        let token = CancellationToken::new();
        let mut op = BasicOperation::new();

        op.begin(&scope, &token).unwrap();
        op.complete(&token).unwrap();
        assert!(op.cancel(&token).unwrap_err().is_state_violation());
    }
}
