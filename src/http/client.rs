//! HTTP verb wrappers guarded by the retry policy
//!
//! Every verb applies the one shared `RetryPolicy` around a single raw
//! transport call. A non-success status surfaces as `AiError::Status`
//! carrying the body text verbatim; the wrappers never interpret it.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::AiError;
use crate::retry::RetryPolicy;

use super::payload;

/// Raw transport result: status code plus unparsed body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP client applying one shared retry policy to every verb.
pub struct RetryingClient {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;

        Ok(Self { http, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, AiError> {
        self.request(Method::GET, url, headers, None).await
    }

    pub async fn head(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, AiError> {
        self.request(Method::HEAD, url, headers, None).await
    }

    pub async fn options(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, AiError> {
        self.request(Method::OPTIONS, url, headers, None).await
    }

    pub async fn delete(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, AiError> {
        self.request(Method::DELETE, url, headers, None).await
    }

    /// POST with a structured payload, flattened to plain JSON before
    /// transmission.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: &HeaderMap,
        json: &T,
    ) -> Result<RawResponse, AiError> {
        let body = payload::flatten(json)?;
        self.request(Method::POST, url, headers, Some(body)).await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: &HeaderMap,
        json: &T,
    ) -> Result<RawResponse, AiError> {
        let body = payload::flatten(json)?;
        self.request(Method::PUT, url, headers, Some(body)).await
    }

    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: &HeaderMap,
        json: &T,
    ) -> Result<RawResponse, AiError> {
        let body = payload::flatten(json)?;
        self.request(Method::PATCH, url, headers, Some(body)).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        json: Option<Value>,
    ) -> Result<RawResponse, AiError> {
        self.policy
            .run(|| {
                let method = method.clone();
                let json = json.clone();
                async move { self.send_once(method, url, headers, json).await }
            })
            .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        json: Option<Value>,
    ) -> Result<RawResponse, AiError> {
        debug!(%method, url, "sending request");

        let mut request = self.http.request(method, url).headers(headers.clone());
        if let Some(json) = &json {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Transport(format!("request timed out: {e}"))
            } else {
                AiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}
