//! Hi-Lo identifier generation.
//!
//! The generator reserves a block of `block_size` values with one call to
//! its [`BlockSource`] and serves the block from memory:
//!
//! ```text
//! sequence:  1 ───────────── 11 ───────────── 21
//! block:    [1 .. 10]       [11 .. 20]       [21 .. 30]
//! next_id:   1 2 3 ... 10    11 12 ... 20     ...
//! ```
//!
//! Blocks from different reservations never overlap because the sequence
//! advances by the block size on every read.

use crate::error::{IdError, IdResult};
use crate::generator::{BlockSource, IdGenerator};
use crate::value::IdValue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// The reserved range `[low, high]`; `low` is the next value to serve.
#[derive(Debug, Clone, Copy)]
struct Block<T> {
    low: T,
    high: T,
}

/// Thread-safe Hi-Lo generator.
///
/// Meant to be a long-lived singleton per identifier type. The instance
/// lock is held across the refill, so concurrent callers never trigger
/// more than one reservation for the same exhausted block.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemorySequenceStore::new());
/// let sequence: Sequence<i64, _> =
///     Sequence::new(store, SequenceConfig::new("order_ids").with_increment(1000))?;
/// sequence.ensure_sequence()?;
///
/// let generator = HiLoIdGenerator::new(sequence);
/// let id = generator.next_id()?;
/// ```
pub struct HiLoIdGenerator<T: IdValue, B: BlockSource<T>> {
    source: B,
    // None until the first reservation and after a block is used up.
    block: Mutex<Option<Block<T>>>,
    blocks_fetched: AtomicU64,
}

impl<T: IdValue, B: BlockSource<T>> HiLoIdGenerator<T, B> {
    /// Creates a generator with an empty block.
    pub fn new(source: B) -> Self {
        Self {
            source,
            block: Mutex::new(None),
            blocks_fetched: AtomicU64::new(0),
        }
    }

    /// Returns the block source.
    pub fn source(&self) -> &B {
        &self.source
    }

    /// Returns how many blocks were reserved so far.
    pub fn blocks_fetched(&self) -> u64 {
        self.blocks_fetched.load(Ordering::Relaxed)
    }

    fn fetch_block(&self) -> IdResult<Block<T>> {
        let size = self.source.block_size();
        let span = size
            .checked_sub(T::ONE)
            .filter(|_| size >= T::ONE)
            .ok_or_else(|| IdError::invalid_config(format!("block size {size} is below 1")))?;

        let low = self.source.next_block_start()?;
        let high = low
            .checked_add(span)
            .ok_or_else(|| IdError::overflow(format!("block starting at {low} with size {size}")))?;

        self.blocks_fetched.fetch_add(1, Ordering::Relaxed);
        debug!(low = %low, high = %high, "Reserved identifier block");
        Ok(Block { low, high })
    }
}

impl<T: IdValue, B: BlockSource<T>> IdGenerator<T> for HiLoIdGenerator<T, B> {
    fn next_id(&self) -> IdResult<T> {
        let mut slot = self.block.lock();
        let block = match *slot {
            Some(block) => block,
            None => self.fetch_block()?,
        };

        let id = block.low;
        *slot = if block.low == block.high {
            None
        } else {
            let low = block
                .low
                .checked_add(T::ONE)
                .ok_or_else(|| IdError::overflow(format!("advancing past {id}")))?;
            Some(Block { low, ..block })
        };

        trace!(id = %id, "Providing id");
        Ok(id)
    }
}

impl<T: IdValue, B: BlockSource<T>> std::fmt::Debug for HiLoIdGenerator<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HiLoIdGenerator")
            .field("block", &*self.block.lock())
            .field("blocks_fetched", &self.blocks_fetched())
            .finish()
    }
}
