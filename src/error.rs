//! Error types for the AI exchange layer

use thiserror::Error;

/// Failures surfaced by the exchange layer.
///
/// Every kind propagates to the caller unmodified; an exchange either returns
/// a complete result or fails with exactly one of these.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network-level failure at the transport boundary (connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status that survived the retry policy. Carries the raw
    /// body text exactly as the upstream sent it.
    #[error("upstream returned status {code}: {body}")]
    Status { code: u16, body: String },

    /// The credential refresh hook itself failed.
    #[error("credential refresh failed: {0}")]
    AuthRefresh(String),

    /// Malformed JSON or missing expected fields in the model response.
    #[error("invalid response from the AI model: {0}")]
    ResponseFormat(String),

    /// Missing or unusable credential, endpoint, or model name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request payload could not be encoded for transmission.
    #[error("failed to encode request payload: {0}")]
    Payload(String),
}

impl AiError {
    /// Status code of the failure, when the upstream produced one.
    ///
    /// Transport failures and local errors carry no code; retry
    /// classification falls back to the plain backoff path for those.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
