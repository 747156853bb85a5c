//! Transaction-scope decorator.

use crate::cancellation::CancellationToken;
use crate::connection::{describe, TransactionHandle};
use crate::error::{PersistenceError, PersistenceResult};
use crate::operation::Operation;
use crate::scope::{CurrentTransactionHolder, OperationScope};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Lifecycle of the transaction owned by a [`TransactionScope`].
///
/// `NotStarted → Active → Committed | RolledBack`. Terminal states have no
/// outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction has been started.
    NotStarted,
    /// A transaction is open and installed in the holder.
    Active,
    /// The transaction was committed.
    Committed,
    /// The transaction was rolled back, or the scope was cancelled before
    /// a transaction existed.
    RolledBack,
}

impl TransactionState {
    /// Returns true for `Committed` and `RolledBack`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        };
        f.write_str(name)
    }
}

/// Wraps an operation in a database transaction.
///
/// The transaction is started on the connection the enclosing
/// [`ConnectionScope`](super::ConnectionScope) installed, and published to
/// nested code through the scope's [`CurrentTransactionHolder`]. This
/// decorator alone commits or rolls it back.
///
/// A failed `complete` leaves the scope `Active` with the transaction still
/// open. The caller follows it with `cancel`, or drops the scope, and either
/// one rolls the transaction back.
pub struct TransactionScope<O: Operation> {
    inner: O,
    state: TransactionState,
    transaction: Option<TransactionHandle>,
    holder: Option<CurrentTransactionHolder>,
    started: Option<Instant>,
}

impl<O: Operation> TransactionScope<O> {
    /// Wraps `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            state: TransactionState::NotStarted,
            transaction: None,
            holder: None,
            started: None,
        }
    }

    /// Returns the transaction state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns the wrapped operation.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    fn elapsed_ms(&self) -> u128 {
        self.started.map_or(0, |t| t.elapsed().as_millis())
    }

    fn clear_holder(&self) {
        if let Some(holder) = &self.holder {
            holder.clear_current();
        }
    }

    fn commit(&mut self) -> PersistenceResult<()> {
        let holder_empty = self
            .holder
            .as_ref()
            .map_or(true, |holder| !holder.has_current());
        if holder_empty {
            return Err(PersistenceError::state_violation(
                "there is no current transaction to commit",
            ));
        }
        let Some(transaction) = self.transaction.as_ref().map(TransactionHandle::clone) else {
            return Err(PersistenceError::state_violation(
                "there is no current transaction to commit",
            ));
        };

        if let Err(error) = transaction.commit() {
            warn!(
                transaction = %describe(Some(&transaction)),
                error = %error,
                "Commit failed, transaction left open"
            );
            return Err(error);
        }
        self.transaction = None;
        self.clear_holder();
        self.state = TransactionState::Committed;
        debug!(
            transaction = %describe(Some(&transaction)),
            elapsed_ms = self.elapsed_ms(),
            "Transaction committed"
        );
        Ok(())
    }

    /// Rolls back the active transaction, if any, and clears the holder.
    fn roll_back(&mut self, reason: &str) -> PersistenceResult<()> {
        let result = match self.transaction.take() {
            Some(transaction) => {
                let result = transaction.rollback();
                debug!(
                    transaction = %describe(Some(&transaction)),
                    elapsed_ms = self.elapsed_ms(),
                    reason,
                    "Transaction rolled back"
                );
                result
            }
            None => Ok(()),
        };
        self.clear_holder();
        self.state = TransactionState::RolledBack;
        result
    }
}

impl<O: Operation> Operation for TransactionScope<O> {
    fn begin(
        &mut self,
        scope: &OperationScope,
        cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        if self.state != TransactionState::NotStarted {
            return Err(PersistenceError::state_violation(format!(
                "cannot begin a transaction scope that is {}",
                self.state
            )));
        }
        if scope.transaction().has_current() {
            return Err(PersistenceError::state_violation(
                "a transaction is already active in this operation scope",
            ));
        }

        let transaction = scope.connection().with(|c| c.begin_transaction())?;
        debug!(
            scope = %scope.id(),
            transaction = %describe(Some(&transaction)),
            "Transaction started"
        );
        scope
            .transaction()
            .replace_current(Some(TransactionHandle::clone(&transaction)));
        self.transaction = Some(transaction);
        self.holder = Some(scope.transaction().clone());
        self.started = Some(Instant::now());
        self.state = TransactionState::Active;

        self.inner.begin(scope, cancellation)
    }

    fn complete(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        self.inner.complete(cancellation)?;
        if self.state != TransactionState::Active {
            return Err(PersistenceError::state_violation(format!(
                "cannot complete a transaction scope that is {}",
                self.state
            )));
        }
        self.commit()
    }

    fn cancel(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        if self.state.is_terminal() {
            return Err(PersistenceError::state_violation(format!(
                "cannot cancel a transaction scope that is {}",
                self.state
            )));
        }
        let forwarded = self.inner.cancel(cancellation);
        let rolled_back = self.roll_back("operation cancelled");
        forwarded.and(rolled_back)
    }
}

impl<O: Operation> Drop for TransactionScope<O> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            warn!("Transaction scope dropped while active, rolling back");
            if let Err(error) = self.roll_back("scope dropped") {
                warn!(error = %error, "Rollback on drop failed");
            }
        }
    }
}
