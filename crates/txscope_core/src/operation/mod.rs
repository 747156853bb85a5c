//! The operation lifecycle and its decorators.
//!
//! An operation is driven through `begin`, then `complete` or `cancel`. A
//! failed `complete` leaves the chain unresolved and is followed by
//! `cancel`, which rolls back and closes. Decorators implement the same trait and wrap the next
//! operation, inserting setup and teardown around the forwarded call:
//!
//! ```text
//! ConnectionScope        opens the connection, closes it on every exit path
//!   └─ TransactionScope  begins, commits or rolls back the transaction
//!        └─ BasicOperation (business lifecycle)
//! ```
//!
//! The connection scope must always be the outer decorator: a transaction
//! cannot begin before its connection is open. The order is fixed when the
//! chain is composed; neither decorator enforces it on its own.

mod basic;
mod connection_scope;
mod transaction_scope;

pub use basic::{BasicOperation, OperationState};
pub use connection_scope::ConnectionScope;
pub use transaction_scope::{TransactionScope, TransactionState};

use crate::cancellation::CancellationToken;
use crate::error::PersistenceResult;
use crate::scope::OperationScope;

/// A unit of work with a three-phase lifecycle.
///
/// Each instance serves exactly one execution. Calling `begin` after the
/// instance left its initial state is a programming error.
pub trait Operation: Send {
    /// Prepares the operation inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns a state violation on re-entry, or the first failure of a
    /// decorator or the wrapped operation.
    fn begin(
        &mut self,
        scope: &OperationScope,
        cancellation: &CancellationToken,
    ) -> PersistenceResult<()>;

    /// Finishes a successful execution.
    ///
    /// # Errors
    ///
    /// Returns the wrapped operation's failure, a commit failure or a state
    /// violation. The execution is then still unresolved and the caller
    /// follows up with `cancel`.
    fn complete(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()>;

    /// Abandons the execution after a failure or a cancellation request.
    ///
    /// # Errors
    ///
    /// Returns a state violation when the execution already finished.
    fn cancel(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()>;
}

impl<O: Operation + ?Sized> Operation for Box<O> {
    fn begin(
        &mut self,
        scope: &OperationScope,
        cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        (**self).begin(scope, cancellation)
    }

    fn complete(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        (**self).complete(cancellation)
    }

    fn cancel(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        (**self).cancel(cancellation)
    }
}
