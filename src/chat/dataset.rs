//! Dataset rendering for analysis prompts

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::AiError;

/// One CSV row keyed by column header, in column order.
pub type Row = IndexMap<String, String>;

/// Placeholder text when a dataset cannot be rendered as rows.
pub const NO_DATA: &str = "No data available";

/// Placeholder text when a query resolves to nothing.
pub const NO_QUERY_RESULTS: &str = "Query yielded no results.";

/// Dataset input accepted by `analyze`.
#[derive(Debug, Clone)]
pub enum Dataset {
    /// Raw text, or a CSV document when the request marks it as CSV.
    Text(String),
    /// Several documents; CSV rows are merged in order.
    Texts(Vec<String>),
    /// Already-structured data, rendered as JSON text.
    Json(Value),
}

impl From<&str> for Dataset {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Dataset {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for Dataset {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Parse header-row CSV into ordered column-keyed rows.
pub fn csv_to_rows(text: &str) -> Result<Vec<Row>, AiError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| AiError::Payload(format!("invalid CSV header row: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AiError::Payload(format!("invalid CSV row: {e}")))?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), field.to_string());
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Render rows as the textual form used inside prompts.
pub fn rows_to_prompt_text(rows: &[Row]) -> String {
    serde_json::to_string(rows).unwrap_or_else(|_| format!("{rows:?}"))
}

/// Render one dataset to prompt text. `csv` selects header-row CSV parsing
/// for textual inputs.
pub fn render(dataset: &Dataset, csv: bool) -> Result<String, AiError> {
    if csv {
        let rows = match dataset {
            Dataset::Text(text) => csv_to_rows(text)?,
            Dataset::Texts(texts) => {
                let mut rows = Vec::new();
                for text in texts {
                    rows.extend(csv_to_rows(text)?);
                }
                rows
            }
            Dataset::Json(_) => return Ok(NO_DATA.to_string()),
        };
        return Ok(rows_to_prompt_text(&rows));
    }

    Ok(match dataset {
        Dataset::Text(text) => text.clone(),
        Dataset::Texts(texts) => texts.join("\n"),
        Dataset::Json(value) => value.to_string(),
    })
}

/// Lookup collaborator resolving a query string into structured data.
#[async_trait]
pub trait DatasetQuery: Send + Sync {
    /// Resolve `query`, or `None` when it yields no results.
    async fn fetch(&self, query: &str) -> Option<Value>;
}

/// Default query source; always answers "no results".
///
/// TODO: wire a real database-backed source once one exists.
#[derive(Debug, Default)]
pub struct NoQuerySource;

#[async_trait]
impl DatasetQuery for NoQuerySource {
    async fn fetch(&self, _query: &str) -> Option<Value> {
        None
    }
}
