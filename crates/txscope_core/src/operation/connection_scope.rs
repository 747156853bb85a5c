//! Connection-scope decorator.

use crate::cancellation::CancellationToken;
use crate::connection::ConnectionSource;
use crate::error::{PersistenceError, PersistenceResult};
use crate::operation::Operation;
use crate::scope::{OperationScope, ScopedConnection};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens a database connection for the duration of the wrapped operation.
///
/// `begin` creates a connection from the source, opens it, installs it in
/// the operation scope and forwards. `cancel` forwards first and closes the
/// connection afterwards, whatever the wrapped operation returned.
/// `complete` closes only once the wrapped operation completed; after a
/// failed `complete` the connection stays open for the `cancel` that rolls
/// back inner work, and dropping the scope closes it otherwise. The
/// connection is closed at most once per execution.
///
/// This decorator must be the outermost one in the chain.
pub struct ConnectionScope<S: ConnectionSource + ?Sized, O: Operation> {
    inner: O,
    source: Arc<S>,
    begun: bool,
    // Declared last so the wrapped operation is dropped first.
    lease: Lease,
}

impl<S: ConnectionSource + ?Sized, O: Operation> ConnectionScope<S, O> {
    /// Wraps `inner` with a connection drawn from `source`.
    pub fn new(source: Arc<S>, inner: O) -> Self {
        Self {
            inner,
            source,
            begun: false,
            lease: Lease::default(),
        }
    }

    /// Returns the wrapped operation.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Returns true while this decorator holds an installed connection.
    pub fn holds_connection(&self) -> bool {
        self.lease.slot.as_ref().is_some_and(ScopedConnection::is_present)
    }

    fn open_connection(&mut self, scope: &OperationScope) -> PersistenceResult<()> {
        if scope.connection().is_present() {
            return Err(PersistenceError::state_violation(
                "operation scope already holds a connection",
            ));
        }
        let mut connection = self.source.create()?;
        connection.open()?;
        debug!(
            scope = %scope.id(),
            database = self.source.descriptor(),
            "Connection opened"
        );
        scope.connection().install(connection)?;
        self.lease.slot = Some(scope.connection().clone());
        Ok(())
    }
}

impl<S: ConnectionSource + ?Sized, O: Operation> Operation for ConnectionScope<S, O> {
    fn begin(
        &mut self,
        scope: &OperationScope,
        cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        if self.begun {
            return Err(PersistenceError::state_violation(
                "connection scope has already begun",
            ));
        }
        self.begun = true;
        self.open_connection(scope)?;
        self.inner.begin(scope, cancellation)
    }

    fn complete(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        self.inner.complete(cancellation)?;
        self.lease.release()
    }

    fn cancel(&mut self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        let outcome = self.inner.cancel(cancellation);
        let released = self.lease.release();
        outcome.and(released)
    }
}

/// The connection slot this decorator is responsible for closing.
#[derive(Default)]
struct Lease {
    slot: Option<ScopedConnection>,
}

impl Lease {
    fn release(&mut self) -> PersistenceResult<()> {
        let Some(slot) = self.slot.take() else {
            return Ok(());
        };
        if slot.release()? {
            debug!("Connection closed");
        }
        Ok(())
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.slot.as_ref().is_some_and(ScopedConnection::is_present) {
            warn!("Connection scope dropped without complete or cancel, closing connection");
            if let Err(error) = self.release() {
                warn!(error = %error, "Failed to close connection");
            }
        }
    }
}
