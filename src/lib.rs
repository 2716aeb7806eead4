//! AI exchange layer for YapBox
//!
//! Resilient HTTP transport with bounded retry and credential refresh,
//! deterministic conversation context assembly, and a chat orchestrator that
//! turns a question or a data-analysis request into one round trip with the
//! remote model.

pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod logsink;
pub mod retry;

pub use chat::{
    AiTasks, AnalyzeRequest, Dataset, DatasetQuery, ExchangeConfig, ExchangeResult, Message,
    NoQuerySource, Role,
};
pub use config::AiConfig;
pub use error::AiError;
pub use http::{RawResponse, RetryingClient};
pub use logsink::{InteractionSink, JsonFileSink, NullSink};
pub use retry::{Benchmark, BenchmarkRecord, BenchmarkStats, RefreshHook, RetryPolicy};
