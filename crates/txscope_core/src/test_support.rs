//! In-crate test doubles.

use crate::cancellation::CancellationToken;
use crate::connection::{Connection, ConnectionSource, Transaction, TransactionHandle};
use crate::error::{PersistenceError, PersistenceResult};
use crate::operation::Operation;
use crate::scope::OperationScope;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    fail_open: AtomicBool,
    fail_commit: AtomicBool,
}

/// Shared call counters for the probe doubles.
#[derive(Debug, Clone, Default)]
pub(crate) struct Probe {
    counters: Arc<Counters>,
}

impl Probe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn transaction(&self) -> TransactionHandle {
        Arc::new(ProbeTransaction {
            probe: self.clone(),
        })
    }

    pub(crate) fn fail_open(&self) {
        self.counters.fail_open.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_commit(&self) {
        self.counters.fail_commit.store(true, Ordering::SeqCst);
    }

    pub(crate) fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn begun(&self) -> usize {
        self.counters.begun.load(Ordering::SeqCst)
    }

    pub(crate) fn committed(&self) -> usize {
        self.counters.committed.load(Ordering::SeqCst)
    }

    pub(crate) fn rolled_back(&self) -> usize {
        self.counters.rolled_back.load(Ordering::SeqCst)
    }
}

struct ProbeTransaction {
    probe: Probe,
}

impl Transaction for ProbeTransaction {
    fn commit(&self) -> PersistenceResult<()> {
        if self.probe.counters.fail_commit.load(Ordering::SeqCst) {
            return Err(PersistenceError::store_unavailable("commit refused"));
        }
        self.probe.counters.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> PersistenceResult<()> {
        self.probe.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct ProbeConnection {
    probe: Probe,
    open: bool,
}

impl ProbeConnection {
    pub(crate) fn opened(probe: &Probe) -> Self {
        let mut connection = Self {
            probe: probe.clone(),
            open: false,
        };
        connection.open().unwrap();
        connection
    }
}

impl Connection for ProbeConnection {
    fn open(&mut self) -> PersistenceResult<()> {
        if self.probe.counters.fail_open.load(Ordering::SeqCst) {
            return Err(PersistenceError::store_unavailable("connection refused"));
        }
        self.probe.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> PersistenceResult<()> {
        if self.open {
            self.probe.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.open = false;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn begin_transaction(&mut self) -> PersistenceResult<TransactionHandle> {
        self.probe.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(self.probe.transaction())
    }

    fn execute(&mut self, _statement: &str) -> PersistenceResult<u64> {
        Ok(0)
    }

    fn query_scalar(&mut self, _statement: &str) -> PersistenceResult<Option<i64>> {
        Ok(None)
    }
}

/// Connection source handing out probe connections.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProbeSource {
    pub(crate) probe: Probe,
}

impl ConnectionSource for ProbeSource {
    fn descriptor(&self) -> &str {
        "probe://memory"
    }

    fn create(&self) -> PersistenceResult<Box<dyn Connection>> {
        Ok(Box::new(ProbeConnection {
            probe: self.probe.clone(),
            open: false,
        }))
    }
}

/// Lifecycle phase of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Begin,
    Complete,
    Cancel,
}

/// Innermost operation recording the phases it was driven through.
#[derive(Debug, Clone, Default)]
pub(crate) struct TraceOperation {
    pub(crate) calls: Arc<Mutex<Vec<Phase>>>,
    pub(crate) saw_transaction: Arc<AtomicBool>,
    fail_on: Option<Phase>,
}

impl TraceOperation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(phase: Phase) -> Self {
        Self {
            fail_on: Some(phase),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Phase> {
        self.calls.lock().clone()
    }

    fn record(&self, phase: Phase) -> PersistenceResult<()> {
        self.calls.lock().push(phase);
        if self.fail_on == Some(phase) {
            return Err(PersistenceError::operation(format!("{phase:?} failed")));
        }
        Ok(())
    }
}

impl Operation for TraceOperation {
    fn begin(
        &mut self,
        scope: &OperationScope,
        _cancellation: &CancellationToken,
    ) -> PersistenceResult<()> {
        self.saw_transaction
            .store(scope.transaction().has_current(), Ordering::SeqCst);
        self.record(Phase::Begin)
    }

    fn complete(&mut self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        self.record(Phase::Complete)
    }

    fn cancel(&mut self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        self.record(Phase::Cancel)
    }
}
