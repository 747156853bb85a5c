//! Connection and transaction contracts consumed by the core.
//!
//! The core never constructs vendor connections. It only asks a
//! [`ConnectionSource`] for a fresh [`Connection`], opens it, and begins a
//! [`Transaction`] on it.

use crate::error::PersistenceResult;
use std::sync::Arc;

/// A database transaction started on an open connection.
///
/// Handles are shared: the transaction decorator resolves them, while the
/// current-transaction holder only exposes them to nested code.
///
/// # Invariants
///
/// - A handle is resolved at most once, by either `commit` or `rollback`
/// - Resolution relies on the store's own atomicity
pub trait Transaction: Send + Sync {
    /// Commits all work done in the transaction.
    ///
    /// # Errors
    ///
    /// Returns a store error if the commit is rejected or the store is
    /// unreachable.
    fn commit(&self) -> PersistenceResult<()>;

    /// Discards all work done in the transaction.
    ///
    /// # Errors
    ///
    /// Returns a store error if the rollback cannot be delivered.
    fn rollback(&self) -> PersistenceResult<()>;
}

/// Shared handle to a live transaction.
pub type TransactionHandle = Arc<dyn Transaction>;

/// A single database connection.
///
/// # Invariants
///
/// - `open` is called at most once per connection by the core
/// - `close` is safe to call on a connection the store already closed
pub trait Connection: Send {
    /// Opens the connection.
    ///
    /// # Errors
    ///
    /// Returns a store error if the database cannot be reached.
    fn open(&mut self) -> PersistenceResult<()>;

    /// Closes the connection and releases its resources.
    ///
    /// # Errors
    ///
    /// Returns a store error if the close handshake fails.
    fn close(&mut self) -> PersistenceResult<()>;

    /// Returns true while the connection is open.
    fn is_open(&self) -> bool;

    /// Starts a transaction on this connection.
    ///
    /// # Errors
    ///
    /// Returns a store error if the transaction cannot be started.
    fn begin_transaction(&mut self) -> PersistenceResult<TransactionHandle>;

    /// Executes a statement that returns no rows and reports the affected
    /// row count.
    ///
    /// # Errors
    ///
    /// Returns a store error if execution fails.
    fn execute(&mut self, statement: &str) -> PersistenceResult<u64>;

    /// Executes a statement and returns the first column of the first row,
    /// or `None` when the store produced no value.
    ///
    /// # Errors
    ///
    /// Returns a store error if execution fails.
    fn query_scalar(&mut self, statement: &str) -> PersistenceResult<Option<i64>>;
}

/// Creates connections to one database.
///
/// # Implementors
///
/// Vendor adapters live outside this crate; `txscope_testkit` ships a
/// recording fake.
pub trait ConnectionSource: Send + Sync {
    /// Human-readable description of the target database, such as a
    /// connection string with credentials removed.
    fn descriptor(&self) -> &str;

    /// Creates a new, not yet opened connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection object cannot be constructed.
    fn create(&self) -> PersistenceResult<Box<dyn Connection>>;
}

impl<S: ConnectionSource + ?Sized> ConnectionSource for Arc<S> {
    fn descriptor(&self) -> &str {
        (**self).descriptor()
    }

    fn create(&self) -> PersistenceResult<Box<dyn Connection>> {
        (**self).create()
    }
}

/// Describes a transaction handle for log output without exposing it.
pub(crate) fn describe(handle: Option<&TransactionHandle>) -> String {
    match handle {
        None => "<NULL>".to_string(),
        Some(tx) => format!("Transaction@{:p}", Arc::as_ptr(tx)),
    }
}
