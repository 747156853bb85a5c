//! # txscope idgen
//!
//! Identifier generation backed by durable sequences.
//!
//! This crate provides:
//! - [`Sequence`], a typed handle on a durable counter
//! - Sequence stores: in-memory, file-backed and SQL with vendor dialects
//! - [`SequenceIdGenerator`] (one round trip per id)
//! - [`HiLoIdGenerator`] (one round trip per block)
//! - [`IdGenerators`], a registry of long-lived generators
//!
//! ## Key Invariants
//!
//! - Identifiers from one generator are unique and increasing
//! - A Hi-Lo block is reserved with exactly one sequence read
//! - Blocks from different reservations never overlap
//! - A failed read leaves no stale block behind

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generator;
mod registry;
mod sequence;
mod store;
mod value;

pub use config::SequenceConfig;
pub use error::{IdError, IdResult};
pub use generator::{BlockSource, HiLoIdGenerator, IdGenerator, SequenceIdGenerator};
pub use registry::{IdGenerators, IdKind};
pub use sequence::Sequence;
pub use store::{
    FileSequenceStore, InMemorySequenceStore, SequenceDialect, SequenceName, SequenceStore,
    SqlSequenceStore,
};
pub use value::IdValue;
