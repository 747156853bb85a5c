//! Database bootstrapping.

use crate::bootstrap::AvailabilityAwaiter;
use crate::cancellation::CancellationToken;
use crate::error::PersistenceResult;
use parking_lot::Mutex;
use std::fmt;
use tracing::{error, info};

/// Readiness of the database as seen by a bootstrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseState {
    /// Bootstrapping has not finished waiting for the database.
    #[default]
    NotAvailableYet,
    /// The database is reachable and the bootstrap step is running.
    Bootstrapping,
    /// The bootstrap step failed.
    BootstrappingFailed,
    /// The database exists and is ready for operations.
    Ready,
}

impl fmt::Display for DatabaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotAvailableYet => "not available yet",
            Self::Bootstrapping => "bootstrapping",
            Self::BootstrappingFailed => "bootstrapping failed",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Creates or migrates the database before the first operation.
pub trait DatabaseBootstrapper: Send + Sync {
    /// Makes sure the database exists.
    ///
    /// # Errors
    ///
    /// Propagates availability and bootstrap step failures.
    fn ensure_database_existence(&self, cancellation: &CancellationToken)
        -> PersistenceResult<()>;

    /// Returns the current readiness.
    fn state(&self) -> DatabaseState;
}

/// Bootstrapper with nothing to do; reports `Ready` once called.
#[derive(Debug, Default)]
pub struct NullBootstrapper {
    state: Mutex<DatabaseState>,
}

impl NullBootstrapper {
    /// Creates a bootstrapper in the `NotAvailableYet` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatabaseBootstrapper for NullBootstrapper {
    fn ensure_database_existence(
        &self,
        _cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        *self.state.lock() = DatabaseState::Ready;
        Ok(())
    }

    fn state(&self) -> DatabaseState {
        *self.state.lock()
    }
}

/// Waits for the database through an awaiter, then runs a bootstrap step.
///
/// The step typically creates the schema and the identifier sequences.
pub struct Bootstrapper<A, F>
where
    A: AvailabilityAwaiter,
    F: Fn(&CancellationToken) -> PersistenceResult<()> + Send + Sync,
{
    awaiter: A,
    step: F,
    state: Mutex<DatabaseState>,
}

impl<A, F> Bootstrapper<A, F>
where
    A: AvailabilityAwaiter,
    F: Fn(&CancellationToken) -> PersistenceResult<()> + Send + Sync,
{
    /// Creates a bootstrapper.
    pub fn new(awaiter: A, step: F) -> Self {
        Self {
            awaiter,
            step,
            state: Mutex::new(DatabaseState::NotAvailableYet),
        }
    }
}

impl<A, F> DatabaseBootstrapper for Bootstrapper<A, F>
where
    A: AvailabilityAwaiter,
    F: Fn(&CancellationToken) -> PersistenceResult<()> + Send + Sync,
{
    fn ensure_database_existence(
        &self,
        cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        self.awaiter.wait_for_database(cancellation)?;
        *self.state.lock() = DatabaseState::Bootstrapping;
        info!("Bootstrapping database");

        match (self.step)(cancellation) {
            Ok(()) => {
                *self.state.lock() = DatabaseState::Ready;
                info!("Database is ready");
                Ok(())
            }
            Err(e) => {
                *self.state.lock() = DatabaseState::BootstrappingFailed;
                error!(error = %e, "Database bootstrapping failed");
                Err(e)
            }
        }
    }

    fn state(&self) -> DatabaseState {
        *self.state.lock()
    }
}
