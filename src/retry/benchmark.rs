//! Wall-clock instrumentation for wrapped operations

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One timed call.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkRecord {
    pub started_at: Instant,
    pub finished_at: Instant,
    pub duration: Duration,
}

/// Aggregate over every call recorded so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkStats {
    pub count: usize,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
}

impl BenchmarkStats {
    fn empty() -> Self {
        Self {
            count: 0,
            total: Duration::ZERO,
            min: Duration::ZERO,
            max: Duration::ZERO,
            avg: Duration::ZERO,
        }
    }
}

/// Timing wrapper for one operation instance.
///
/// Each `Benchmark` owns its own record list; distinct wrapped operations
/// never share samples. A failing call is timed like any other and its
/// output is returned unchanged.
pub struct Benchmark {
    label: String,
    records: Mutex<Vec<BenchmarkRecord>>,
}

impl Benchmark {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Time one call and append the sample.
    pub async fn measure<T, F, Fut>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let started_at = Instant::now();
        let output = op().await;
        let finished_at = Instant::now();

        self.records.lock().unwrap().push(BenchmarkRecord {
            started_at,
            finished_at,
            duration: finished_at - started_at,
        });

        output
    }

    /// Samples recorded so far, oldest first.
    pub fn records(&self) -> Vec<BenchmarkRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Recompute aggregates from the full sample list.
    pub fn stats(&self) -> BenchmarkStats {
        let records = self.records.lock().unwrap();
        if records.is_empty() {
            return BenchmarkStats::empty();
        }

        let mut total = Duration::ZERO;
        let mut min = records[0].duration;
        let mut max = records[0].duration;
        for record in records.iter() {
            total += record.duration;
            min = min.min(record.duration);
            max = max.max(record.duration);
        }

        BenchmarkStats {
            count: records.len(),
            total,
            min,
            max,
            avg: total / records.len() as u32,
        }
    }
}
