//! The persistence feature: boot and per-operation invocation.

use crate::bootstrap::{
    AvailabilityAwaiter, ConnectionAvailabilityAwaiter, DatabaseBootstrapper, DatabaseState,
    NullAvailabilityAwaiter, NullBootstrapper,
};
use crate::cancellation::CancellationToken;
use crate::config::PersistenceConfig;
use crate::connection::ConnectionSource;
use crate::error::PersistenceResult;
use crate::operation::{BasicOperation, ConnectionScope, Operation, TransactionScope};
use crate::scope::OperationScope;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Wires connection and transaction handling around operations.
///
/// Every call to [`invoke`](Self::invoke) gets a fresh [`OperationScope`]
/// and a freshly composed decorator chain:
///
/// ```text
/// ConnectionScope -> TransactionScope (if enabled) -> BasicOperation
/// ```
///
/// # Example
///
/// ```ignore
/// let persistence = Persistence::new(source, PersistenceConfig::default());
/// persistence.boot(&CancellationToken::new())?;
///
/// let rows = persistence.invoke(&CancellationToken::new(), |scope, _| {
///     scope.connection().with(|c| c.execute("DELETE FROM outbox"))
/// })?;
/// ```
pub struct Persistence<S: ConnectionSource + ?Sized + 'static> {
    source: Arc<S>,
    config: PersistenceConfig,
    awaiter: Box<dyn AvailabilityAwaiter>,
    bootstrapper: Box<dyn DatabaseBootstrapper>,
}

impl<S: ConnectionSource + ?Sized + 'static> Persistence<S> {
    /// Creates the feature with no availability check and no bootstrap step.
    pub fn new(source: Arc<S>, config: PersistenceConfig) -> Self {
        Self {
            source,
            config,
            awaiter: Box::new(NullAvailabilityAwaiter),
            bootstrapper: Box::new(NullBootstrapper::new()),
        }
    }

    /// Replaces the availability awaiter used on boot.
    #[must_use]
    pub fn with_availability_awaiter(mut self, awaiter: impl AvailabilityAwaiter + 'static) -> Self {
        self.awaiter = Box::new(awaiter);
        self
    }

    /// Waits on boot until a connection from the source can be opened,
    /// following the configured availability retry policy.
    #[must_use]
    pub fn with_connection_probe(self) -> Self {
        let awaiter = ConnectionAvailabilityAwaiter::new(Arc::clone(&self.source))
            .with_retry(self.config.availability_retry.clone());
        self.with_availability_awaiter(awaiter)
    }

    /// Replaces the bootstrapper used on boot.
    #[must_use]
    pub fn with_bootstrapper(mut self, bootstrapper: impl DatabaseBootstrapper + 'static) -> Self {
        self.bootstrapper = Box::new(bootstrapper);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    /// Returns the connection source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the readiness reported by the bootstrapper.
    pub fn database_state(&self) -> DatabaseState {
        self.bootstrapper.state()
    }

    /// Waits for the database, then makes sure it exists.
    ///
    /// # Errors
    ///
    /// Propagates failures of the awaiter and the bootstrapper.
    pub fn boot(&self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        info!(
            database = self.source.descriptor(),
            transactions = self.config.enable_transactions,
            "Booting persistence"
        );
        self.awaiter.wait_for_database(cancellation)?;
        self.bootstrapper.ensure_database_existence(cancellation)
    }

    /// Wraps `inner` in the configured decorator chain.
    pub fn decorate<O: Operation + 'static>(&self, inner: O) -> Box<dyn Operation> {
        let source = Arc::clone(&self.source);
        if self.config.enable_transactions {
            Box::new(ConnectionScope::new(source, TransactionScope::new(inner)))
        } else {
            Box::new(ConnectionScope::new(source, inner))
        }
    }

    /// Runs `body` as one operation.
    ///
    /// On success the chain is completed, which commits the transaction and
    /// closes the connection. If `begin`, `body` or `complete` fails, or
    /// cancellation is requested before completion, the chain is cancelled
    /// and the original error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Cancelled`](crate::PersistenceError::Cancelled)
    /// without touching the database when cancellation was requested up
    /// front; otherwise the first failure of the chain or the body.
    pub fn invoke<R>(
        &self,
        cancellation: &CancellationToken,
        body: impl FnOnce(&OperationScope, &CancellationToken) -> PersistenceResult<R>,
    ) -> PersistenceResult<R> {
        cancellation.check()?;

        let scope = OperationScope::new();
        let mut operation = self.decorate(BasicOperation::new());
        debug!(scope = %scope.id(), "Invoking operation");

        if let Err(error) = operation.begin(&scope, cancellation) {
            abandon(operation.as_mut(), cancellation);
            return Err(error);
        }

        let outcome = body(&scope, cancellation).and_then(|value| {
            cancellation.check()?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                if let Err(error) = operation.complete(cancellation) {
                    abandon(operation.as_mut(), cancellation);
                    return Err(error);
                }
                Ok(value)
            }
            Err(error) => {
                abandon(operation.as_mut(), cancellation);
                Err(error)
            }
        }
    }
}

/// Cancels a failed chain, keeping the original error for the caller.
fn abandon(operation: &mut dyn Operation, cancellation: &CancellationToken) {
    if let Err(error) = operation.cancel(cancellation) {
        warn!(error = %error, "Cancelling a failed operation failed");
    }
}
