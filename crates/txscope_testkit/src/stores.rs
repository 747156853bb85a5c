//! Instrumented sequence store.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use txscope_idgen::{IdError, IdResult, InMemorySequenceStore, SequenceName, SequenceStore};

#[derive(Debug, Default)]
struct Script {
    failing_reads: usize,
    empty_reads: usize,
    read_delay: Option<Duration>,
}

/// In-memory store counting every call, with scripted read failures.
#[derive(Debug, Default)]
pub struct CountingSequenceStore {
    inner: InMemorySequenceStore,
    exists_calls: AtomicUsize,
    create_calls: AtomicUsize,
    next_value_calls: AtomicUsize,
    script: Mutex<Script>,
}

impl CountingSequenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` reads fail with a store-unavailable error.
    pub fn fail_next_reads(&self, count: usize) {
        self.script.lock().failing_reads = count;
    }

    /// The next `count` reads answer without a value.
    pub fn answer_empty_next_reads(&self, count: usize) {
        self.script.lock().empty_reads = count;
    }

    /// Every read sleeps for `delay` first, widening race windows.
    pub fn delay_reads(&self, delay: Duration) {
        self.script.lock().read_delay = Some(delay);
    }

    /// Calls to `exists`.
    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    /// Calls to `create`.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Calls to `next_value`, including failed ones.
    pub fn next_value_calls(&self) -> usize {
        self.next_value_calls.load(Ordering::SeqCst)
    }
}

impl SequenceStore for CountingSequenceStore {
    fn exists(&self, sequence: &SequenceName) -> IdResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(sequence)
    }

    fn create(&self, sequence: &SequenceName, start_with: i64, increment: i64) -> IdResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create(sequence, start_with, increment)
    }

    fn next_value(&self, sequence: &SequenceName) -> IdResult<Option<i64>> {
        self.next_value_calls.fetch_add(1, Ordering::SeqCst);
        let delay = {
            let mut script = self.script.lock();
            if script.failing_reads > 0 {
                script.failing_reads -= 1;
                return Err(IdError::store_unavailable(format!("read of {sequence} refused")));
            }
            if script.empty_reads > 0 {
                script.empty_reads -= 1;
                return Ok(None);
            }
            script.read_delay
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.inner.next_value(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_reads() {
        let store = CountingSequenceStore::new();
        let name = SequenceName::new(None, "ids");
        store.create(&name, 1, 1).unwrap();
        store.fail_next_reads(1);
        store.answer_empty_next_reads(1);

        assert!(store.next_value(&name).unwrap_err().is_store_unavailable());
        assert_eq!(store.next_value(&name).unwrap(), None);
        assert_eq!(store.next_value(&name).unwrap(), Some(1));
        assert_eq!(store.next_value_calls(), 3);
    }
}
