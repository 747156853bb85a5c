//! Stress helpers for concurrent identifier generation.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use txscope_idgen::{IdGenerator, IdValue};

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Identifiers drawn by each thread.
    pub ids_per_thread: usize,
}

impl StressConfig {
    /// Total number of identifiers drawn.
    pub fn total(&self) -> usize {
        self.threads * self.ids_per_thread
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            ids_per_thread: 1_000,
        }
    }
}

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult<T> {
    /// Every identifier drawn, grouped by thread in draw order.
    pub per_thread: Vec<Vec<T>>,
    /// Number of failed draws.
    pub failed: usize,
    /// Wall-clock duration.
    pub duration: Duration,
}

impl<T: IdValue + Hash> StressTestResult<T> {
    /// All identifiers drawn.
    pub fn ids(&self) -> Vec<T> {
        self.per_thread.iter().flatten().copied().collect()
    }

    /// Number of distinct identifiers.
    pub fn distinct(&self) -> usize {
        self.per_thread.iter().flatten().collect::<HashSet<_>>().len()
    }

    /// True if no identifier was handed out twice.
    pub fn all_distinct(&self) -> bool {
        self.distinct() == self.ids().len()
    }

    /// True if every thread saw strictly increasing identifiers.
    pub fn increasing_per_thread(&self) -> bool {
        self.per_thread
            .iter()
            .all(|ids| ids.windows(2).all(|pair| pair[0] < pair[1]))
    }

    /// Identifiers per second.
    pub fn ids_per_second(&self) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds > 0.0 {
            self.ids().len() as f64 / seconds
        } else {
            0.0
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Identifiers: {}", self.ids().len());
        println!("Distinct: {}", self.distinct());
        println!("Failed: {}", self.failed);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ids/sec", self.ids_per_second());
    }
}

/// Draws identifiers from `generator` on `config.threads` threads at once.
pub fn stress_concurrent_draws<T, G>(generator: Arc<G>, config: &StressConfig) -> StressTestResult<T>
where
    T: IdValue,
    G: IdGenerator<T> + 'static,
{
    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let generator = Arc::clone(&generator);
            let count = config.ids_per_thread;
            thread::spawn(move || {
                let mut ids = Vec::with_capacity(count);
                let mut failed = 0usize;
                for _ in 0..count {
                    match generator.next_id() {
                        Ok(id) => ids.push(id),
                        Err(_) => failed += 1,
                    }
                }
                (ids, failed)
            })
        })
        .collect();

    let mut per_thread = Vec::with_capacity(config.threads);
    let mut failed = 0;
    for handle in handles {
        let (ids, thread_failed) = handle.join().expect("Stress thread panicked");
        per_thread.push(ids);
        failed += thread_failed;
    }

    StressTestResult {
        per_thread,
        failed,
        duration: start.elapsed(),
    }
}
