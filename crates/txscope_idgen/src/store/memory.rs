//! Process-local sequence store.

use crate::error::{IdError, IdResult};
use crate::store::{SequenceName, SequenceStore};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Counter {
    // None once the last value of i64 was served.
    current: Option<i64>,
    increment: i64,
}

/// Keeps sequences in memory. Values are lost when the process exits.
///
/// With start 1 and increment 10 the sequence yields 1, 11, 21, ... A
/// sequence serves values up to and including `i64::MAX`; reads after that
/// fail with an overflow error.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    counters: Mutex<HashMap<SequenceName, Counter>>,
}

impl InMemorySequenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many sequences exist.
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    /// Returns true if no sequence was created.
    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn exists(&self, sequence: &SequenceName) -> IdResult<bool> {
        Ok(self.counters.lock().contains_key(sequence))
    }

    fn create(&self, sequence: &SequenceName, start_with: i64, increment: i64) -> IdResult<()> {
        self.counters.lock().insert(
            sequence.clone(),
            Counter {
                current: Some(start_with),
                increment,
            },
        );
        Ok(())
    }

    fn next_value(&self, sequence: &SequenceName) -> IdResult<Option<i64>> {
        let mut counters = self.counters.lock();
        let counter = counters
            .get_mut(sequence)
            .ok_or_else(|| IdError::sequence_not_found(sequence))?;
        let value = counter
            .current
            .ok_or_else(|| IdError::overflow(format!("sequence {sequence} is exhausted")))?;
        counter.current = value.checked_add(counter.increment);
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_start_then_steps_by_increment() {
        let store = InMemorySequenceStore::new();
        let name = SequenceName::new(None, "ids");
        store.create(&name, 1, 10).unwrap();

        assert_eq!(store.next_value(&name).unwrap(), Some(1));
        assert_eq!(store.next_value(&name).unwrap(), Some(11));
        assert_eq!(store.next_value(&name).unwrap(), Some(21));
    }

    #[test]
    fn sequences_are_independent() {
        let store = InMemorySequenceStore::new();
        let a = SequenceName::new(Some("s".into()), "a");
        let b = SequenceName::new(Some("s".into()), "b");
        store.create(&a, 1, 1).unwrap();
        store.create(&b, 100, 1).unwrap();

        assert_eq!(store.next_value(&a).unwrap(), Some(1));
        assert_eq!(store.next_value(&b).unwrap(), Some(100));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn missing_sequence_is_reported() {
        let store = InMemorySequenceStore::new();
        let name = SequenceName::new(None, "ids");
        assert!(!store.exists(&name).unwrap());
        assert!(matches!(
            store.next_value(&name),
            Err(IdError::SequenceNotFound { .. })
        ));
    }

    #[test]
    fn serves_last_value_then_reports_exhaustion() {
        let store = InMemorySequenceStore::new();
        let name = SequenceName::new(None, "ids");
        store.create(&name, i64::MAX - 10, 10).unwrap();

        assert_eq!(store.next_value(&name).unwrap(), Some(i64::MAX - 10));
        assert_eq!(store.next_value(&name).unwrap(), Some(i64::MAX));
        assert!(store.next_value(&name).unwrap_err().is_data_integrity());
        assert!(store.next_value(&name).unwrap_err().is_data_integrity());
    }
}
