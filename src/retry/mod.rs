//! Resilient call wrappers
//!
//! - `policy`: bounded retry with selectable backoff, conditional retry
//!   suppression, and credential-refresh hooks
//! - `benchmark`: wall-clock instrumentation for one wrapped operation

pub mod benchmark;
pub mod policy;

pub use benchmark::{Benchmark, BenchmarkRecord, BenchmarkStats};
pub use policy::{RefreshHook, RetryPolicy};
