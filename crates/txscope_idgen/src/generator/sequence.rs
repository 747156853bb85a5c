//! One round trip per identifier.

use crate::error::IdResult;
use crate::generator::IdGenerator;
use crate::sequence::Sequence;
use crate::store::SequenceStore;
use crate::value::IdValue;

/// Hands out every sequence value directly.
///
/// Each call reads the sequence. Prefer [`HiLoIdGenerator`](super::HiLoIdGenerator)
/// when identifiers are drawn often.
#[derive(Debug)]
pub struct SequenceIdGenerator<T: IdValue, S: SequenceStore + ?Sized> {
    sequence: Sequence<T, S>,
}

impl<T: IdValue, S: SequenceStore + ?Sized> SequenceIdGenerator<T, S> {
    /// Creates a generator over `sequence`.
    pub fn new(sequence: Sequence<T, S>) -> Self {
        Self { sequence }
    }

    /// Returns the sequence.
    pub fn sequence(&self) -> &Sequence<T, S> {
        &self.sequence
    }
}

impl<T: IdValue, S: SequenceStore + ?Sized> IdGenerator<T> for SequenceIdGenerator<T, S> {
    fn next_id(&self) -> IdResult<T> {
        self.sequence.next_value()
    }
}
