//! Content extraction and JSON coercion

use crate::http::CallResult;
use serde_json::Value;
use tracing::warn;

/// Text found at a JSON pointer, or an empty string when the path is absent
///
/// Strings are returned as-is, arrays of text parts are joined, any other
/// value is serialized.
pub fn text_at(response: &Value, pointer: &str) -> String {
    match response.pointer(pointer) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect::<Vec<_>>()
            .join(""),
        Some(other) => other.to_string(),
    }
}

/// Parse extracted text as JSON when a response format was requested
///
/// A parse failure is not an error: the raw text is returned unchanged.
pub fn coerce(text: String, wants_json: bool) -> CallResult {
    if !wants_json {
        return CallResult::Text(text);
    }

    match serde_json::from_str::<Value>(strip_code_fence(&text)) {
        Ok(value) => CallResult::Json(value),
        Err(err) => {
            warn!("Response is not valid JSON, returning raw text: {}", err);
            CallResult::Text(text)
        }
    }
}

/// Drop a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening line
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}
