//! Blocking HTTP transport using reqwest

use crate::http::{map_http_error, redact_url, HttpMethod, HttpTransport, ImageFetcher, TransportError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, ClientBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("modelgate/", env!("CARGO_PKG_VERSION"));

/// Default transport and image fetcher backed by a blocking reqwest client
///
/// The client is built on first use, so constructing a transport never fails.
pub struct ReqwestTransport {
    client: OnceLock<Result<Client, String>>,
    connect_timeout: Duration,
    request_timeout: Duration,
    max_response_size: usize,
}

impl ReqwestTransport {
    /// Create a transport with default timeouts
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(10), Duration::from_secs(120))
    }

    /// Create a transport with custom timeouts
    pub fn with_timeouts(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            client: OnceLock::new(),
            connect_timeout,
            request_timeout,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    fn client(&self) -> Result<&Client, TransportError> {
        self.client
            .get_or_init(|| {
                ClientBuilder::new()
                    .connect_timeout(self.connect_timeout)
                    .timeout(self.request_timeout)
                    .user_agent(USER_AGENT)
                    .gzip(true)
                    .build()
                    .map_err(|e| format!("Failed to create HTTP client: {}", e))
            })
            .as_ref()
            .map_err(|e| TransportError::Network(e.clone()))
    }

    fn read_body(&self, response: reqwest::blocking::Response) -> Result<Vec<u8>, TransportError> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(TransportError::Decode(format!(
                    "Response size {} exceeds maximum {}",
                    content_length, self.max_response_size
                )));
            }
        }

        let bytes = response.bytes()?;
        if bytes.len() > self.max_response_size {
            return Err(TransportError::Decode(format!(
                "Response size {} exceeds maximum {}",
                bytes.len(),
                self.max_response_size
            )));
        }
        Ok(bytes.to_vec())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    fn call(
        &self,
        url: &str,
        method: HttpMethod,
        payload: &Value,
        headers: &BTreeMap<String, String>,
    ) -> Result<Value, TransportError> {
        let client = self.client()?;

        let mut builder = match method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url).json(payload),
        };
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send()?;
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let body = response.text().ok();
            warn!("Request failed with status {}", status);
            return Err(map_http_error(status, body));
        }

        let body = self.read_body(response)?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl ImageFetcher for ReqwestTransport {
    fn fetch_base64(&self, url: &str) -> Result<String, TransportError> {
        let fetch_error = |message: String| TransportError::Fetch {
            url: redact_url(url),
            message,
        };

        let client = self.client()?;
        let response = client.get(url).send().map_err(|e| fetch_error(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status.as_u16())));
        }

        let bytes = self.read_body(response)?;
        debug!("Fetched {} bytes from {}", bytes.len(), redact_url(url));
        Ok(STANDARD.encode(bytes))
    }
}
