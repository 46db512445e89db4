//! Tests for the reqwest-backed transport against a mock server

use modelgate_core::http::{ReqwestTransport, TransportError};
use modelgate_core::{CallParams, CallResult, HttpMethod, HttpTransport, ImageFetcher, ProviderKind};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run a blocking transport call off the async test runtime
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

fn json_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Authorization".to_string(), "Bearer test-key".to_string());
    headers
}

#[tokio::test]
async fn test_post_sends_headers_and_parses_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "m"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "chatcmpl-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/chat/completions", server.uri());
    let result = blocking(move || {
        ReqwestTransport::new().call(&url, HttpMethod::Post, &json!({"model": "m"}), &json_headers())
    })
    .await;

    assert_eq!(result.unwrap(), json!({"id": "chatcmpl-1"}));
}

#[tokio::test]
async fn test_error_status_is_mapped_with_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "Rate limit reached", "type": "rate_limit"}})),
        )
        .mount(&server)
        .await;

    let url = format!("{}/messages", server.uri());
    let result = blocking(move || ReqwestTransport::new().call(&url, HttpMethod::Post, &json!({}), &json_headers())).await;

    assert_eq!(
        result.unwrap_err(),
        TransportError::Status {
            status: 429,
            message: "Rate limit reached".to_string()
        }
    );
}

#[tokio::test]
async fn test_gateway_timeout_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let url = server.uri();
    let result = blocking(move || ReqwestTransport::new().call(&url, HttpMethod::Post, &json!({}), &json_headers())).await;

    assert_eq!(result.unwrap_err(), TransportError::Timeout);
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let url = server.uri();
    let result = blocking(move || ReqwestTransport::new().call(&url, HttpMethod::Post, &json!({}), &json_headers())).await;

    assert!(matches!(result, Err(TransportError::Decode(_))));
}

#[tokio::test]
async fn test_fetch_base64_encodes_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = server.uri();
    let (found, missing) = blocking(move || {
        let transport = ReqwestTransport::new();
        (
            transport.fetch_base64(&format!("{}/images/cat.png", base)),
            transport.fetch_base64(&format!("{}/images/missing.png", base)),
        )
    })
    .await;

    assert_eq!(found.unwrap(), "aGVsbG8=");
    match missing {
        Err(TransportError::Fetch { url, message }) => {
            assert!(url.ends_with("/images/missing.png"));
            assert_eq!(message, "HTTP 404");
        }
        other => panic!("Expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_instance_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "g-live-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"answer\": 42}"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = server.uri();
    let result = blocking(move || {
        let mut instance = ProviderKind::Gemini.create("g-live-key", Some(endpoint.as_str()));
        let format = serde_json::from_value(json!({
            "name": "answer",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {"answer": {"type": "integer"}},
                "required": ["answer"],
                "additionalProperties": false
            }
        }))
        .unwrap();
        instance.generate_text("What is the answer?", &CallParams::new().with_response_format(format))
    })
    .await
    .unwrap();

    assert_eq!(result, CallResult::Json(json!({"answer": 42})));
}

#[tokio::test]
async fn test_instance_failure_over_http_is_redacted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})))
        .mount(&server)
        .await;

    let endpoint = server.uri();
    let result = blocking(move || {
        let mut instance = ProviderKind::OpenAI.create("sk-live-secret", Some(endpoint.as_str()));
        instance.generate_text("hi", &CallParams::new())
    })
    .await
    .unwrap();

    let serialized: Value = serde_json::to_value(&result).unwrap();
    assert_eq!(serialized["status"], "failure");
    assert!(serialized["message"].as_str().unwrap().contains("bad key"));
    assert!(!serialized.to_string().contains("sk-live-secret"));
}

#[test]
fn test_connection_failure_message_omits_query_key() {
    let mut instance = ProviderKind::Gemini.create("g-unreachable-secret", Some("http://127.0.0.1:9"));

    let result = instance.generate_text("hi", &CallParams::new()).unwrap();

    match result {
        CallResult::Failure(report) => {
            assert!(!report.message.contains("g-unreachable-secret"), "{}", report.message);
            assert!(!report.request.url.contains("g-unreachable-secret"));
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[test]
fn test_fetch_failure_redacts_signed_url() {
    let result = ReqwestTransport::new().fetch_base64("http://127.0.0.1:9/cat.png?token=signed-secret");

    match result {
        Err(TransportError::Fetch { url, message }) => {
            assert_eq!(url, "http://127.0.0.1:9/cat.png?token=[REDACTED]");
            assert!(!message.contains("signed-secret"));
        }
        other => panic!("Expected fetch error, got {:?}", other),
    }
}
