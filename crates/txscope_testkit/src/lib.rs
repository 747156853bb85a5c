//! # txscope testkit
//!
//! Test utilities for txscope.
//!
//! This crate provides:
//! - A recording fake connection source with injectable failures
//! - Recording and failing operations
//! - A counting sequence store
//! - Property-based test generators using proptest
//! - Concurrent Hi-Lo stress helpers
//! - Temp-directory fixtures for the file sequence store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use txscope_testkit::prelude::*;
//!
//! #[test]
//! fn commits_once() {
//!     let source = FakeConnectionSource::new();
//!     let persistence = Persistence::new(source.shared(), PersistenceConfig::default());
//!     persistence.invoke(&CancellationToken::new(), |_, _| Ok(())).unwrap();
//!     assert_eq!(source.committed(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fakes;
pub mod fixtures;
pub mod generators;
pub mod operations;
pub mod stores;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fakes::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::init_tracing;
    pub use crate::operations::*;
    pub use crate::stores::*;
    pub use crate::stress::*;
}

pub use fakes::*;
pub use fixtures::*;
pub use generators::*;
pub use operations::*;
pub use stores::*;
pub use stress::*;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
