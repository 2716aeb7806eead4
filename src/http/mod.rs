//! Resilient HTTP transport
//!
//! One wrapper per verb, each composing the shared retry policy around a
//! single raw transport call.

pub mod client;
pub mod payload;

pub use client::{RawResponse, RetryingClient};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::AiError;

/// Standard headers for the AI endpoint: bearer authorization.
pub fn auth_headers(token: &str) -> Result<HeaderMap, AiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| AiError::Configuration(format!("API key is not a valid header value: {e}")))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_headers_build_bearer() {
        let headers = auth_headers("abc123").unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn test_auth_headers_reject_control_characters() {
        assert!(auth_headers("bad\nkey").is_err());
    }
}
