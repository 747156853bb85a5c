//! Test fixtures for sequences and generators.

use crate::stores::CountingSequenceStore;
use std::sync::Arc;
use tempfile::TempDir;
use txscope_idgen::{FileSequenceStore, HiLoIdGenerator, IdValue, Sequence, SequenceConfig};

/// A file sequence store in a temporary directory, removed on drop.
pub struct TempSequenceStore {
    /// The store.
    pub store: Arc<FileSequenceStore>,
    _temp_dir: TempDir,
}

impl TempSequenceStore {
    /// Creates a store in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            FileSequenceStore::open(temp_dir.path()).expect("Failed to open sequence store");
        Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        }
    }

    /// Opens a second store over the same directory.
    pub fn reopen(&self) -> FileSequenceStore {
        FileSequenceStore::open(self._temp_dir.path()).expect("Failed to reopen sequence store")
    }
}

impl Default for TempSequenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TempSequenceStore {
    type Target = FileSequenceStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Creates and ensures a sequence over a counting store.
pub fn counting_sequence<T: IdValue>(
    config: SequenceConfig,
) -> (Arc<CountingSequenceStore>, Sequence<T, CountingSequenceStore>) {
    let store = Arc::new(CountingSequenceStore::new());
    let sequence = Sequence::new(Arc::clone(&store), config).expect("Invalid sequence config");
    sequence.ensure_sequence().expect("Failed to ensure sequence");
    (store, sequence)
}

/// A Hi-Lo generator over a counting store, plus the store for assertions.
pub fn counting_hilo<T: IdValue>(
    start_with: i64,
    increment: i64,
) -> (
    Arc<CountingSequenceStore>,
    HiLoIdGenerator<T, Sequence<T, CountingSequenceStore>>,
) {
    let config = SequenceConfig::new("hilo_ids")
        .with_start(start_with)
        .with_increment(increment);
    let (store, sequence) = counting_sequence(config);
    (store, HiLoIdGenerator::new(sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use txscope_idgen::{IdGenerator, SequenceName, SequenceStore};

    #[test]
    fn temp_store_reopens_same_directory() {
        let fixture = TempSequenceStore::new();
        let name = SequenceName::new(None, "ids");
        fixture.create(&name, 1, 1).unwrap();
        assert_eq!(fixture.next_value(&name).unwrap(), Some(1));
        assert_eq!(fixture.reopen().next_value(&name).unwrap(), Some(2));
    }

    #[test]
    fn counting_hilo_starts_empty() {
        let (store, generator) = counting_hilo::<i64>(1, 10);
        assert_eq!(store.next_value_calls(), 0);
        assert_eq!(generator.next_id().unwrap(), 1);
        assert_eq!(store.next_value_calls(), 1);
    }
}
