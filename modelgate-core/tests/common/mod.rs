//! Shared test doubles for the injected I/O primitives

#![allow(dead_code)]

use modelgate_core::http::TransportError;
use modelgate_core::{HttpMethod, HttpTransport, ImageFetcher, ProviderInstance, ProviderKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const SECRET: &str = "sk-very-secret-123";
pub const ENDPOINT: &str = "https://api.example.com";

/// One recorded transport call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub method: HttpMethod,
    pub payload: Value,
    pub headers: BTreeMap<String, String>,
}

/// Transport that records every call and answers with a canned response
pub struct RecordingTransport {
    response: Result<Value, TransportError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn answering(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(response),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            response: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpTransport for RecordingTransport {
    fn call(
        &self,
        url: &str,
        method: HttpMethod,
        payload: &Value,
        headers: &BTreeMap<String, String>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            method,
            payload: payload.clone(),
            headers: headers.clone(),
        });
        self.response.clone()
    }
}

/// Fetcher that records requested URLs and returns a fixed encoding
#[derive(Default)]
pub struct RecordingFetcher {
    fetched: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl ImageFetcher for RecordingFetcher {
    fn fetch_base64(&self, url: &str) -> Result<String, TransportError> {
        self.fetched.lock().unwrap().push(url.to_string());
        Ok("aGVsbG8=".to_string())
    }
}

/// Instance wired to recording doubles
pub fn recording_instance(
    kind: ProviderKind,
    response: Value,
) -> (ProviderInstance, Arc<RecordingTransport>, Arc<RecordingFetcher>) {
    let transport = RecordingTransport::answering(response);
    let fetcher = Arc::new(RecordingFetcher::default());
    let instance = kind
        .create(SECRET, Some(ENDPOINT))
        .with_transport(transport.clone())
        .with_fetcher(fetcher.clone());
    (instance, transport, fetcher)
}

/// A canned success response in the family's own envelope
pub fn success_response(kind: ProviderKind, text: &str) -> Value {
    match kind {
        ProviderKind::OpenAI | ProviderKind::Mistral | ProviderKind::DeepSeek => {
            serde_json::json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]})
        }
        ProviderKind::Anthropic => {
            serde_json::json!({"content": [{"type": "text", "text": text}], "role": "assistant"})
        }
        ProviderKind::Gemini => {
            serde_json::json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
        }
    }
}
