//! Identifier generators.

mod hilo;
mod sequence;

pub use hilo::HiLoIdGenerator;
pub use sequence::SequenceIdGenerator;

use crate::error::IdResult;
use crate::sequence::Sequence;
use crate::store::SequenceStore;
use crate::value::IdValue;
use std::sync::Arc;

/// Produces unique identifiers of type `T`.
pub trait IdGenerator<T: IdValue>: Send + Sync {
    /// Returns the next identifier.
    ///
    /// # Errors
    ///
    /// Propagates failures of the backing sequence.
    fn next_id(&self) -> IdResult<T>;
}

impl<T: IdValue, G: IdGenerator<T> + ?Sized> IdGenerator<T> for Arc<G> {
    fn next_id(&self) -> IdResult<T> {
        (**self).next_id()
    }
}

/// Where a Hi-Lo generator reserves its blocks.
pub trait BlockSource<T: IdValue>: Send + Sync {
    /// Reserves a block and returns its first value. One round trip.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    fn next_block_start(&self) -> IdResult<T>;

    /// Number of values in every block.
    fn block_size(&self) -> T;
}

impl<T: IdValue, S: SequenceStore + ?Sized> BlockSource<T> for Sequence<T, S> {
    fn next_block_start(&self) -> IdResult<T> {
        self.next_value()
    }

    fn block_size(&self) -> T {
        self.increment()
    }
}
