//! HTTP layer for provider calls
//!
//! This module owns everything between a built request and a raw provider
//! response:
//! - The ephemeral `RequestDescriptor` and its credential redaction
//! - The two injected blocking primitives (`HttpTransport`, `ImageFetcher`)
//! - The executor that simulates, performs, or wraps the failure of a call
//! - The uniform `CallResult`

pub mod client;
pub mod error;

use crate::config::{is_sensitive_name, redact_by_field_name, SafeLogging, REDACTED};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use client::ReqwestTransport;
pub use error::{map_http_error, TransportError};

/// HTTP method of a provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A fully built provider request, constructed fresh for every call
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    /// May carry credentials; see [`RequestDescriptor::redacted`]
    pub headers: BTreeMap<String, String>,
    pub payload: Value,
    pub debug_prompt: bool,
    pub debug_response: bool,
}

impl RequestDescriptor {
    /// Create a POST request with a JSON content type
    pub fn post(url: impl Into<String>, payload: Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers,
            payload,
            debug_prompt: false,
            debug_response: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_debug_flags(mut self, debug_prompt: bool, debug_response: bool) -> Self {
        self.debug_prompt = debug_prompt;
        self.debug_response = debug_response;
        self
    }

    /// Copy of this request with credential-bearing header values and URL
    /// query parameters replaced by [`REDACTED`]
    pub fn redacted(&self) -> Self {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), redact_by_field_name(name, value)))
            .collect();

        Self {
            url: redact_url(&self.url),
            method: self.method,
            headers,
            payload: self.payload.clone(),
            debug_prompt: self.debug_prompt,
            debug_response: self.debug_response,
        }
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self.redacted();
        f.debug_struct("RequestDescriptor")
            .field("url", &redacted.url)
            .field("method", &redacted.method)
            .field("headers", &redacted.headers)
            .field("payload", &redacted.payload)
            .field("debug_prompt", &redacted.debug_prompt)
            .field("debug_response", &redacted.debug_response)
            .finish()
    }
}

impl SafeLogging for RequestDescriptor {
    fn safe_for_logging(&self) -> String {
        format!("{} {}", self.method.as_str(), redact_url(&self.url))
    }
}

/// Replace the value of every sensitive query parameter, leaving the rest of
/// the URL byte-for-byte intact
fn redact_url(url: &str) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };
    let Some((base, query)) = without_fragment.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if is_sensitive_name(name) => format!("{}={}", name, REDACTED),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    match fragment {
        Some(fragment) => format!("{}?{}#{}", base, query, fragment),
        None => format!("{}?{}", base, query),
    }
}

/// Injected blocking HTTP primitive
///
/// Any deadline must be enforced by the implementation; the layer never
/// times out on its own.
pub trait HttpTransport: Send + Sync {
    fn call(
        &self,
        url: &str,
        method: HttpMethod,
        payload: &Value,
        headers: &BTreeMap<String, String>,
    ) -> Result<Value, TransportError>;
}

/// Injected blocking binary-fetch primitive returning base64 data
pub trait ImageFetcher: Send + Sync {
    fn fetch_base64(&self, url: &str) -> Result<String, TransportError>;
}

/// Structured failure carrying the redacted request for diagnosis
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    pub request: RequestDescriptor,
    pub message: String,
}

impl FailureReport {
    /// Build a report; the request is always redacted here
    pub fn new(request: &RequestDescriptor, message: impl Into<String>) -> Self {
        Self {
            request: request.redacted(),
            message: message.into(),
        }
    }
}

impl Serialize for FailureReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FailureReport", 3)?;
        state.serialize_field("status", "failure")?;
        state.serialize_field("request", &self.request)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

/// Uniform outcome of a provider call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallResult {
    /// Extracted answer text
    Text(String),
    /// Answer text coerced to structured data
    Json(Value),
    /// Raw provider response (debug-response mode)
    Raw(Value),
    /// Unexecuted, redacted request (debug-prompt mode)
    Simulated(RequestDescriptor),
    /// Violated response-format invariants; no request was attempted
    InvalidResponseFormat(Vec<String>),
    /// Transport failure
    Failure(FailureReport),
}

impl CallResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CallResult::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CallResult::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&RequestDescriptor> {
        match self {
            CallResult::Simulated(request) => Some(request),
            CallResult::Failure(report) => Some(&report.request),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CallResult::Failure(_))
    }
}

/// Run a request through the transport
///
/// Never performs I/O in debug-prompt mode and never returns an error: a
/// transport failure becomes [`CallResult::Failure`]. On success the raw
/// response is returned as [`CallResult::Raw`] for the caller to extract.
pub fn execute(transport: &dyn HttpTransport, provider: &str, request: RequestDescriptor) -> CallResult {
    let request_id = Uuid::new_v4();

    if request.debug_prompt {
        debug!(
            "Simulating {} request {} [request_id: {}]",
            provider,
            request.safe_for_logging(),
            request_id
        );
        return CallResult::Simulated(request.redacted());
    }

    info!("Executing request to {} [request_id: {}]", provider, request_id);
    debug!("Request: {} [request_id: {}]", request.safe_for_logging(), request_id);

    match transport.call(&request.url, request.method, &request.payload, &request.headers) {
        Ok(response) => {
            info!("Request completed for {} [request_id: {}]", provider, request_id);
            CallResult::Raw(response)
        }
        Err(err) => {
            warn!(
                "Request to {} failed [request_id: {}]: {}",
                provider, request_id, err
            );
            CallResult::Failure(FailureReport::new(&request, err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
        fail: bool,
    }

    impl HttpTransport for CountingTransport {
        fn call(
            &self,
            _url: &str,
            _method: HttpMethod,
            _payload: &Value,
            _headers: &BTreeMap<String, String>,
        ) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TransportError::Network("connection reset".to_string()))
            } else {
                Ok(json!({"ok": true}))
            }
        }
    }

    fn sample_request() -> RequestDescriptor {
        RequestDescriptor::post(
            "https://example.com/v1/models/m:generateContent?key=secret-key&alt=json",
            json!({"contents": []}),
        )
        .with_header("Authorization", "Bearer secret-key")
    }

    #[test]
    fn test_redacted_hides_header_and_query_credentials() {
        let redacted = sample_request().redacted();
        assert_eq!(redacted.headers["Authorization"], REDACTED);
        assert_eq!(redacted.headers["Content-Type"], "application/json");
        assert_eq!(
            redacted.url,
            "https://example.com/v1/models/m:generateContent?key=[REDACTED]&alt=json"
        );
    }

    #[test]
    fn test_redact_url_without_query_is_untouched() {
        assert_eq!(redact_url("https://example.com/v1/messages"), "https://example.com/v1/messages");
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let rendered = format!("{:?}", sample_request());
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_simulate_skips_transport() {
        let transport = CountingTransport {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let request = sample_request().with_debug_flags(true, false);

        let result = execute(&transport, "openai", request);

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        let simulated = result.as_request().unwrap();
        assert_eq!(simulated.headers["Authorization"], REDACTED);
    }

    #[test]
    fn test_transport_failure_is_wrapped() {
        let transport = CountingTransport {
            calls: AtomicUsize::new(0),
            fail: true,
        };

        let result = execute(&transport, "openai", sample_request());

        match result {
            CallResult::Failure(report) => {
                assert!(report.message.contains("connection reset"));
                assert_eq!(report.request.headers["Authorization"], REDACTED);
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_serializes_with_status() {
        let report = FailureReport::new(&sample_request(), "boom");
        let value = serde_json::to_value(CallResult::Failure(report)).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["message"], "boom");
        assert_eq!(value["request"]["headers"]["Authorization"], REDACTED);
    }
}
