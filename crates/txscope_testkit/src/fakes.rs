//! Recording fake connections.
//!
//! A [`FakeConnectionSource`] hands out connections that count every open,
//! close, begin, commit and rollback, log every statement, and fail on
//! demand. Clones share the same counters.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use txscope_core::{
    Connection, ConnectionSource, PersistenceError, PersistenceResult, Transaction,
    TransactionHandle,
};

/// Which calls the fake database refuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePlan {
    /// `Connection::open` fails.
    pub open: bool,
    /// `Connection::begin_transaction` fails.
    pub begin: bool,
    /// `Transaction::commit` fails.
    pub commit: bool,
    /// `Transaction::rollback` fails.
    pub rollback: bool,
    /// `execute` and `query_scalar` fail.
    pub statements: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    created: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    resolved_twice: AtomicBool,
    plan: Mutex<FailurePlan>,
    statements: Mutex<Vec<String>>,
    scalars: Mutex<VecDeque<Option<i64>>>,
}

impl FakeState {
    fn refuse(&self, pick: impl Fn(&FailurePlan) -> bool, what: &str) -> PersistenceResult<()> {
        let plan = *self.plan.lock();
        if pick(&plan) {
            Err(PersistenceError::store_unavailable(format!("fake database refused {what}")))
        } else {
            Ok(())
        }
    }
}

/// Connection source over an in-process fake database.
#[derive(Debug, Clone, Default)]
pub struct FakeConnectionSource {
    state: Arc<FakeState>,
}

impl FakeConnectionSource {
    /// Creates a fake with no failures planned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a shared handle suitable for `Persistence::new`.
    pub fn shared(&self) -> Arc<Self> {
        Arc::new(self.clone())
    }

    /// Replaces the failure plan.
    pub fn set_plan(&self, plan: FailurePlan) {
        *self.state.plan.lock() = plan;
    }

    /// Makes `open` fail or succeed.
    pub fn fail_open(&self, fail: bool) {
        self.state.plan.lock().open = fail;
    }

    /// Makes `begin_transaction` fail or succeed.
    pub fn fail_begin(&self, fail: bool) {
        self.state.plan.lock().begin = fail;
    }

    /// Makes `commit` fail or succeed.
    pub fn fail_commit(&self, fail: bool) {
        self.state.plan.lock().commit = fail;
    }

    /// Makes `rollback` fail or succeed.
    pub fn fail_rollback(&self, fail: bool) {
        self.state.plan.lock().rollback = fail;
    }

    /// Makes statements fail or succeed.
    pub fn fail_statements(&self, fail: bool) {
        self.state.plan.lock().statements = fail;
    }

    /// Queues the answer of the next `query_scalar`. An empty queue answers
    /// `None`.
    pub fn push_scalar(&self, value: Option<i64>) {
        self.state.scalars.lock().push_back(value);
    }

    /// Connections created.
    pub fn created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    /// Successful opens.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Closes of open connections.
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Connections opened and not closed yet.
    pub fn open_connections(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }

    /// Transactions begun.
    pub fn begun(&self) -> usize {
        self.state.begun.load(Ordering::SeqCst)
    }

    /// Successful commits.
    pub fn committed(&self) -> usize {
        self.state.committed.load(Ordering::SeqCst)
    }

    /// Successful rollbacks.
    pub fn rolled_back(&self) -> usize {
        self.state.rolled_back.load(Ordering::SeqCst)
    }

    /// True if any transaction was committed or rolled back twice.
    pub fn resolved_twice(&self) -> bool {
        self.state.resolved_twice.load(Ordering::SeqCst)
    }

    /// Statements executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().clone()
    }
}

impl ConnectionSource for FakeConnectionSource {
    fn descriptor(&self) -> &str {
        "fake://txscope"
    }

    fn create(&self) -> PersistenceResult<Box<dyn Connection>> {
        self.state.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
            open: false,
        }))
    }
}

/// A connection to the fake database.
#[derive(Debug)]
pub struct FakeConnection {
    state: Arc<FakeState>,
    open: bool,
}

impl FakeConnection {
    fn ensure_open(&self) -> PersistenceResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(PersistenceError::state_violation("connection is not open"))
        }
    }

    fn record(&self, statement: &str) -> PersistenceResult<()> {
        self.ensure_open()?;
        self.state.statements.lock().push(statement.to_string());
        self.state.refuse(|p| p.statements, "statement")
    }
}

impl Connection for FakeConnection {
    fn open(&mut self) -> PersistenceResult<()> {
        if self.open {
            return Err(PersistenceError::state_violation("connection is already open"));
        }
        self.state.refuse(|p| p.open, "connection")?;
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> PersistenceResult<()> {
        if self.open {
            self.open = false;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn begin_transaction(&mut self) -> PersistenceResult<TransactionHandle> {
        self.ensure_open()?;
        self.state.refuse(|p| p.begin, "transaction")?;
        self.state.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeTransaction {
            state: Arc::clone(&self.state),
            resolved: AtomicBool::new(false),
        }))
    }

    fn execute(&mut self, statement: &str) -> PersistenceResult<u64> {
        self.record(statement)?;
        Ok(0)
    }

    fn query_scalar(&mut self, statement: &str) -> PersistenceResult<Option<i64>> {
        self.record(statement)?;
        Ok(self.state.scalars.lock().pop_front().flatten())
    }
}

/// A transaction on the fake database.
#[derive(Debug)]
pub struct FakeTransaction {
    state: Arc<FakeState>,
    resolved: AtomicBool,
}

impl FakeTransaction {
    fn resolve(&self) -> PersistenceResult<()> {
        if self.resolved.swap(true, Ordering::SeqCst) {
            self.state.resolved_twice.store(true, Ordering::SeqCst);
            return Err(PersistenceError::state_violation(
                "transaction was already resolved",
            ));
        }
        Ok(())
    }
}

impl Transaction for FakeTransaction {
    fn commit(&self) -> PersistenceResult<()> {
        self.state.refuse(|p| p.commit, "commit")?;
        self.resolve()?;
        self.state.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> PersistenceResult<()> {
        self.state.refuse(|p| p.rollback, "rollback")?;
        self.resolve()?;
        self.state.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
