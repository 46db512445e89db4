//! Transport error types and HTTP error mapping

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures raised by an injected transport or image fetcher
///
/// These never escape the executor; they are folded into a
/// [`FailureReport`](crate::http::FailureReport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection or protocol failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not valid JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Image download failed
    #[error("Failed to fetch '{url}': {message}")]
    Fetch { url: String, message: String },
}

impl From<reqwest::Error> for TransportError {
    /// The request URL is dropped from the message; it may carry a `?key=`
    /// credential
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Map an HTTP status code and response body to a TransportError
pub fn map_http_error(status: StatusCode, body: Option<String>) -> TransportError {
    let message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or(body)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TransportError::Timeout,
        _ => TransportError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Extract a human-readable message from a provider error body
fn extract_error_message(json: &Value) -> Option<String> {
    // OpenAI, Anthropic, Mistral and Gemini: { "error": { "message": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // Generic format: { "message": "..." }
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    // { "error": "..." }
    if let Some(error) = json.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }

    // Mistral validation errors: { "detail": [ { "msg": "..." } ] } or { "detail": "..." }
    match json.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|d| d.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
