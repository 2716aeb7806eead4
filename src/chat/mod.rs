//! Chat exchange: context assembly, dataset rendering, and orchestration

pub mod client;
pub mod context;
pub mod dataset;
pub mod models;

pub use client::{AiTasks, AnalyzeRequest};
pub use context::{append_message, compose, with_system_directive};
pub use dataset::{Dataset, DatasetQuery, NoQuerySource, Row};
pub use models::{
    ChatCompletion, ChatRequest, Choice, ChoiceMessage, ExchangeConfig, ExchangeResult, Message,
    Role,
};
