//! Per-execution scoped state.
//!
//! An [`OperationScope`] is created at the start of each operation execution
//! and dropped at its end. It carries the execution's connection slot and its
//! current-transaction holder, so nested code reaches the live transaction
//! through an explicit value instead of process-wide state.

use crate::connection::{describe, Connection, TransactionHandle};
use crate::error::{PersistenceError, PersistenceResult};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};
use uuid::Uuid;

/// Scoped slot holding at most one active transaction handle.
///
/// The holder never resolves the transaction it carries. Whoever installed
/// the handle owns commit, rollback and disposal; the holder only makes the
/// handle visible to code running inside the same execution.
#[derive(Clone, Default)]
pub struct CurrentTransactionHolder {
    current: Arc<Mutex<Option<TransactionHandle>>>,
}

impl CurrentTransactionHolder {
    /// Creates an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current transaction, if any.
    #[must_use]
    pub fn current(&self) -> Option<TransactionHandle> {
        self.current.lock().clone()
    }

    /// Returns true while a transaction is installed.
    #[must_use]
    pub fn has_current(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Installs `transaction` as the current one and returns the previous
    /// handle.
    pub fn replace_current(
        &self,
        transaction: Option<TransactionHandle>,
    ) -> Option<TransactionHandle> {
        let mut slot = self.current.lock();
        trace!(
            from = %describe(slot.as_ref()),
            to = %describe(transaction.as_ref()),
            "Replacing current transaction"
        );
        std::mem::replace(&mut *slot, transaction)
    }

    /// Removes the current transaction. Safe to call when none is present.
    pub fn clear_current(&self) {
        self.replace_current(None);
    }
}

impl fmt::Debug for CurrentTransactionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentTransactionHolder")
            .field("current", &describe(self.current.lock().as_ref()))
            .finish()
    }
}

/// Scoped slot holding the execution's connection.
///
/// The connection-scope decorator installs the opened connection here and
/// releases it when the operation ends. Everything else borrows it through
/// [`ScopedConnection::with`].
#[derive(Clone, Default)]
pub struct ScopedConnection {
    slot: Arc<Mutex<Option<Box<dyn Connection>>>>,
}

impl ScopedConnection {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a connection is installed.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Returns true while an installed connection reports itself open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot.lock().as_ref().is_some_and(|c| c.is_open())
    }

    /// Runs `f` against the installed connection.
    ///
    /// # Errors
    ///
    /// Fails with a state violation if no connection was installed, otherwise
    /// returns whatever `f` returns.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut dyn Connection) -> PersistenceResult<R>,
    ) -> PersistenceResult<R> {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(connection) => f(connection.as_mut()),
            None => Err(PersistenceError::state_violation(
                "no connection has been opened for this operation",
            )),
        }
    }

    /// Installs an opened connection. A connection rejected because the slot
    /// is occupied is closed before the error is returned.
    pub(crate) fn install(&self, mut connection: Box<dyn Connection>) -> PersistenceResult<()> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            drop(slot);
            if let Err(error) = connection.close() {
                warn!(error = %error, "Failed to close rejected connection");
            }
            return Err(PersistenceError::state_violation(
                "a connection is already held by this operation scope",
            ));
        }
        *slot = Some(connection);
        Ok(())
    }

    /// Takes the connection out of the slot and closes it if it is still
    /// open. Returns true if a connection was present.
    pub(crate) fn release(&self) -> PersistenceResult<bool> {
        let taken = self.slot.lock().take();
        match taken {
            Some(mut connection) => {
                if connection.is_open() {
                    connection.close()?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("present", &self.is_present())
            .field("open", &self.is_open())
            .finish()
    }
}

/// Context of one operation execution.
///
/// Each execution gets its own scope; scopes are never shared between
/// concurrent executions.
#[derive(Debug)]
pub struct OperationScope {
    id: Uuid,
    connection: ScopedConnection,
    transaction: CurrentTransactionHolder,
}

impl OperationScope {
    /// Creates a fresh scope with an empty connection slot and holder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            connection: ScopedConnection::new(),
            transaction: CurrentTransactionHolder::new(),
        }
    }

    /// Returns the correlation id of this execution.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the connection slot.
    #[must_use]
    pub fn connection(&self) -> &ScopedConnection {
        &self.connection
    }

    /// Returns the current-transaction holder.
    #[must_use]
    pub fn transaction(&self) -> &CurrentTransactionHolder {
        &self.transaction
    }

    /// Shortcut for `self.transaction().current()`.
    #[must_use]
    pub fn current_transaction(&self) -> Option<TransactionHandle> {
        self.transaction.current()
    }
}

impl Default for OperationScope {
    fn default() -> Self {
        Self::new()
    }
}
