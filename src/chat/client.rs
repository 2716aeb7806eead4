//! Chat orchestration
//!
//! Turns one question (or a data-analysis request) into one resilient round
//! trip with the remote model: compose the outgoing transcript, POST it,
//! parse the answer, append it to the transcript, and hand the interaction
//! record to the logging sink.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::AiError;
use crate::http::{auth_headers, RawResponse, RetryingClient};
use crate::logsink::InteractionSink;
use crate::retry::{Benchmark, BenchmarkStats, RetryPolicy};

use super::context;
use super::dataset::{self, Dataset, DatasetQuery, NoQuerySource, NO_QUERY_RESULTS};
use super::models::{
    ChatCompletion, ChatRequest, ExchangeConfig, ExchangeResult, Message,
};

/// Parameters for one data-analysis exchange.
pub struct AnalyzeRequest<'a> {
    pub question: &'a str,
    pub dataset: Dataset,
    /// Parse the main and file datasets as header-row CSV.
    pub csv: bool,
    /// Put the rendered data sections before the question.
    pub dataset_first: bool,
    pub system_directive: Option<&'a str>,
    pub context: Option<&'a [Message]>,
    /// Extra CSV document appended as a labeled section.
    pub dataset_from_file: Option<&'a str>,
    /// Query resolved through the configured `DatasetQuery` source.
    pub query: Option<&'a str>,
}

impl<'a> AnalyzeRequest<'a> {
    pub fn new(question: &'a str, dataset: Dataset) -> Self {
        Self {
            question,
            dataset,
            csv: false,
            dataset_first: false,
            system_directive: None,
            context: None,
            dataset_from_file: None,
            query: None,
        }
    }
}

/// Client for question/answer exchanges with the remote model.
pub struct AiTasks {
    endpoint: String,
    model: String,
    credential: Arc<RwLock<SecretString>>,
    http: RetryingClient,
    sink: Option<Arc<dyn InteractionSink>>,
    query_source: Arc<dyn DatasetQuery>,
    timing: Benchmark,
}

impl AiTasks {
    /// Build a client from a validated configuration, retry policy included.
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let policy = RetryPolicy::from_config(&config);
        Self::with_policy(config, policy)
    }

    /// Build a client with an explicit retry policy (custom backoff,
    /// refresh hooks installed).
    pub fn with_policy(config: AiConfig, policy: RetryPolicy) -> Result<Self, AiError> {
        config.validate()?;

        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AiError::Configuration("api_key is not set".to_string()))?;
        let http = RetryingClient::new(policy, config.timeout())?;

        Ok(Self {
            endpoint: config.api_endpoint,
            model: config.model,
            credential: Arc::new(RwLock::new(SecretString::new(api_key))),
            http,
            sink: None,
            query_source: Arc::new(NoQuerySource),
            timing: Benchmark::new("chat_completion"),
        })
    }

    /// Install an interaction sink receiving one record per exchange.
    pub fn with_sink(mut self, sink: Arc<dyn InteractionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the default "no results" query source.
    pub fn with_query_source(mut self, source: Arc<dyn DatasetQuery>) -> Self {
        self.query_source = source;
        self
    }

    /// Shared credential handle. A refresh hook that writes through this
    /// handle is visible to every later exchange.
    pub fn credential(&self) -> Arc<RwLock<SecretString>> {
        Arc::clone(&self.credential)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Timing aggregates over every remote round trip made so far.
    pub fn timing_stats(&self) -> BenchmarkStats {
        self.timing.stats()
    }

    /// Ask a question. The caller's context is never mutated; the result
    /// carries a new transcript with the user and assistant turns appended.
    pub async fn ask(
        &self,
        question: &str,
        system_directive: Option<&str>,
        context: Option<&[Message]>,
    ) -> Result<ExchangeResult, AiError> {
        let base = context.unwrap_or(&[]);
        let outgoing = context::compose(
            base,
            system_directive,
            false,
            Some(Message::user(question)),
        );

        let raw = self.send_to_model(&outgoing).await?;

        let raw_value: Value = serde_json::from_str(&raw.body)
            .map_err(|e| AiError::ResponseFormat(format!("model response is not JSON: {e}")))?;
        let completion: ChatCompletion = serde_json::from_value(raw_value.clone())
            .map_err(|e| AiError::ResponseFormat(format!("unexpected response shape: {e}")))?;
        let answer = extract_answer(&completion)?;

        let updated = context::compose(&outgoing, None, false, Some(Message::assistant(&answer)));

        self.record_interaction(question, &answer, &raw_value);

        Ok(ExchangeResult {
            answer,
            context: updated,
            config: ExchangeConfig {
                endpoint: self.endpoint.clone(),
                model: self.model.clone(),
            },
        })
    }

    /// Analyze a dataset: render it (and any secondary sections) to text,
    /// build a composite prompt around the question, and delegate to `ask`.
    pub async fn analyze(&self, request: AnalyzeRequest<'_>) -> Result<ExchangeResult, AiError> {
        let sections = self.prepare_sections(&request).await?;

        let prompt = if request.dataset_first {
            format!("{sections}\n\n{}", request.question)
        } else {
            format!("{}\n\n{sections}", request.question)
        };

        self.ask(&prompt, request.system_directive, request.context)
            .await
    }

    async fn prepare_sections(&self, request: &AnalyzeRequest<'_>) -> Result<String, AiError> {
        let mut sections = vec![
            "Main dataset:".to_string(),
            dataset::render(&request.dataset, request.csv)?,
        ];

        if let Some(text) = request.dataset_from_file {
            sections.push("\nDataset from file:".to_string());
            sections.push(dataset::render(&Dataset::Text(text.to_string()), true)?);
        }

        if let Some(query) = request.query {
            let resolved = self.query_source.fetch(query).await;
            sections.push("Dataset from query:".to_string());
            sections.push(match resolved {
                Some(value) => dataset::render(&Dataset::Json(value), false)?,
                None => NO_QUERY_RESULTS.to_string(),
            });
        }

        Ok(sections.join("\n"))
    }

    async fn send_to_model(&self, messages: &[Message]) -> Result<RawResponse, AiError> {
        let token = self.credential.read().unwrap().expose_secret().clone();
        let headers = auth_headers(&token)?;

        let payload = ChatRequest {
            messages: messages.to_vec(),
            model: self.model.clone(),
        };

        debug!(
            model = %self.model,
            turns = messages.len(),
            "sending chat completion request"
        );

        self.timing
            .measure(|| self.http.post(&self.endpoint, &headers, &payload))
            .await
    }

    fn record_interaction(&self, question: &str, answer: &str, raw_response: &Value) {
        let Some(sink) = &self.sink else {
            return;
        };

        let entry = json!({
            "question": question,
            "answer": answer,
            "response": raw_response,
        });

        // Observability must never fail the exchange.
        if let Err(err) = sink.record(&entry) {
            warn!(error = %err, "failed to record interaction");
        }
    }
}

/// Concatenate every choice's content with a single space, trimmed.
fn extract_answer(completion: &ChatCompletion) -> Result<String, AiError> {
    if completion.choices.is_empty() {
        return Err(AiError::ResponseFormat(
            "model response contained no choices".to_string(),
        ));
    }

    let joined = completion
        .choices
        .iter()
        .map(|choice| choice.message.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(joined.trim().to_string())
}
