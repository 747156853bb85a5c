//! # txscope core
//!
//! Wraps units of work with a database connection and transaction whose
//! lifetime is tied to the operation.
//!
//! This crate provides:
//! - The three-phase [`Operation`] lifecycle (`begin`, `complete`, `cancel`)
//! - [`ConnectionScope`] and [`TransactionScope`] decorators
//! - A per-execution [`OperationScope`] carrying the connection and the
//!   current transaction
//! - [`Persistence`], which boots the database and invokes operations
//! - Availability awaiters and bootstrappers
//!
//! ## Lifecycle
//!
//! ```text
//! begin:    open connection -> begin transaction -> business begin
//! complete: business complete -> commit -> close connection
//! cancel:   business cancel -> rollback -> close connection
//! ```
//!
//! ## Key Invariants
//!
//! - One connection and at most one transaction per execution
//! - The connection is closed exactly once on every exit path
//! - A transaction is committed or rolled back, never both, never left open
//! - Lifecycle violations surface as errors and are never retried

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bootstrap;
mod cancellation;
mod config;
mod connection;
mod error;
mod operation;
mod persistence;
mod scope;

#[cfg(test)]
mod test_support;

pub use bootstrap::{
    AvailabilityAwaiter, Bootstrapper, ConnectionAvailabilityAwaiter, DatabaseBootstrapper,
    DatabaseState, NullAvailabilityAwaiter, NullBootstrapper, TcpAvailabilityAwaiter,
};
pub use cancellation::CancellationToken;
pub use config::{PersistenceConfig, RetryConfig};
pub use connection::{Connection, ConnectionSource, Transaction, TransactionHandle};
pub use error::{PersistenceError, PersistenceResult};
pub use operation::{
    BasicOperation, ConnectionScope, Operation, OperationState, TransactionScope,
    TransactionState,
};
pub use persistence::Persistence;
pub use scope::{CurrentTransactionHolder, OperationScope, ScopedConnection};
