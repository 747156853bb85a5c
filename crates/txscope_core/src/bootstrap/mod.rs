//! Waiting for the database and making sure it exists before the first
//! operation runs.

mod availability;
mod bootstrapper;

pub use availability::{
    AvailabilityAwaiter, ConnectionAvailabilityAwaiter, NullAvailabilityAwaiter,
    TcpAvailabilityAwaiter,
};
pub use bootstrapper::{Bootstrapper, DatabaseBootstrapper, DatabaseState, NullBootstrapper};
