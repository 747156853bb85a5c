//! Benchmark utilities.

use std::sync::Arc;
use txscope_idgen::{
    HiLoIdGenerator, IdValue, InMemorySequenceStore, Sequence, SequenceConfig, SequenceIdGenerator,
    SequenceStore,
};

/// Block sizes compared across Hi-Lo benchmarks.
pub const BLOCK_SIZES: [i64; 4] = [1, 10, 100, 1000];

/// Creates and ensures a sequence on `store`.
pub fn ensured_sequence<T: IdValue, S: SequenceStore>(
    store: Arc<S>,
    name: &str,
    increment: i64,
) -> Sequence<T, S> {
    let config = SequenceConfig::new(name).with_increment(increment);
    let sequence = Sequence::new(store, config).expect("Invalid benchmark sequence");
    sequence
        .ensure_sequence()
        .expect("Failed to ensure benchmark sequence");
    sequence
}

/// Hi-Lo generator over a fresh in-memory store.
pub fn memory_hilo(block_size: i64) -> HiLoIdGenerator<i64, Sequence<i64, InMemorySequenceStore>> {
    let store = Arc::new(InMemorySequenceStore::new());
    HiLoIdGenerator::new(ensured_sequence(store, "bench_ids", block_size))
}

/// Sequence generator over a fresh in-memory store.
pub fn memory_sequence() -> SequenceIdGenerator<i64, InMemorySequenceStore> {
    let store = Arc::new(InMemorySequenceStore::new());
    SequenceIdGenerator::new(ensured_sequence(store, "bench_ids", 1))
}
