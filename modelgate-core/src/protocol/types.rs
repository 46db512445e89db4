//! Core protocol types for provider calls
//!
//! The design prioritizes:
//! - A small canonical message model every adapter can map from
//! - Loose deserialization where callers hand us untyped JSON, so that shape
//!   problems surface as reportable violations instead of serde errors
//! - Pass-through of provider-specific parameters

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A single piece of multi-part message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Attachment {
    /// Plain text
    Text { text: String },
    /// Image reference (a URL), resolved per adapter at request build time
    Image {
        #[serde(rename = "ref")]
        reference: String,
    },
}

impl Attachment {
    pub fn text(text: impl Into<String>) -> Self {
        Attachment::Text { text: text.into() }
    }

    pub fn image(reference: impl Into<String>) -> Self {
        Attachment::Image {
            reference: reference.into(),
        }
    }
}

/// Content of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Ordered attachments (text and images)
    Parts(Vec<Attachment>),
}

impl MessageContent {
    /// Get the text if this is plain text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }

    /// Concatenate every text fragment, skipping images
    pub fn joined_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    Attachment::Text { text } => Some(text.as_str()),
                    Attachment::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A message in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self { role, content }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(text.into()))
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text(text.into()))
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, MessageContent::Text(text.into()))
    }
}

/// Caller-supplied prompt input
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// A single user turn
    Text(String),
    /// Already well-formed messages
    Messages(Vec<Message>),
    /// Untyped input: a string, or an array of `[role, content]` pairs and
    /// `{role, content}` objects
    Json(Value),
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(messages: Vec<Message>) -> Self {
        Prompt::Messages(messages)
    }
}

impl From<Value> for Prompt {
    fn from(value: Value) -> Self {
        Prompt::Json(value)
    }
}

/// Expected output schema for a call
///
/// Fields default when absent or mistyped so a malformed format still
/// deserializes and can be checked with [`ResponseFormat::violations`].
/// A non-string `name` reads as missing and anything but `true` in `strict`
/// reads as not strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_strict")]
    pub strict: bool,

    #[serde(default)]
    pub schema: Value,
}

impl ResponseFormat {
    /// Create a strict response format
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            strict: true,
            schema,
        }
    }

    /// List every violated invariant, one message each. Empty means valid.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push("response format `name` is missing".to_string());
        }
        if !self.strict {
            violations.push("response format `strict` must be true".to_string());
        }

        let schema = self.schema.as_object();
        if schema.and_then(|s| s.get("type")).and_then(Value::as_str) != Some("object") {
            violations.push("`schema.type` must be \"object\"".to_string());
        }

        let has_properties = schema
            .and_then(|s| s.get("properties"))
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty());
        if !has_properties {
            violations.push("`schema.properties` must be a non-empty object".to_string());
        }

        if !schema
            .and_then(|s| s.get("required"))
            .is_some_and(Value::is_array)
        {
            violations.push("`schema.required` must be an array".to_string());
        }

        if schema.and_then(|s| s.get("additionalProperties")) != Some(&Value::Bool(false)) {
            violations.push("`schema.additionalProperties` must be false".to_string());
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name,
        _ => String::new(),
    })
}

fn lenient_strict<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// A non-object response format becomes an empty one that fails every check
fn lenient_format<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ResponseFormat>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(Some(ResponseFormat {
            name: String::new(),
            strict: false,
            schema: Value::Null,
        })),
    }
}

/// Accepted spellings of call parameter names, normalized before parsing
const PARAM_ALIASES: &[(&str, &str)] = &[
    ("responseFormat", "response_format"),
    ("debugPrompt", "debug_prompt"),
    ("debugResponse", "debug_response"),
    ("maxTokens", "max_tokens"),
];

/// Per-call parameters
///
/// Unknown keys are kept in `extra` and passed through to the provider
/// payload untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, deserialize_with = "lenient_format", skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Return the would-be request instead of performing it
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug_prompt: bool,

    /// Return the raw provider response instead of the extracted content
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug_response: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Provider-specific pass-through fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameters from an untyped JSON object, accepting camelCase
    /// aliases for the recognized keys
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(map) => serde_json::from_value(Value::Object(normalize_keys(map))),
            other => serde_json::from_value(other),
        }
    }

    /// Layer these parameters over `defaults`; explicit values win
    pub fn merged_over(&self, defaults: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        if defaults.is_empty() {
            return Ok(self.clone());
        }

        let mut merged = normalize_keys(defaults.clone());
        if let Value::Object(explicit) = serde_json::to_value(self)? {
            for (key, value) in explicit {
                merged.insert(key, value);
            }
        }
        serde_json::from_value(Value::Object(merged))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_debug_prompt(mut self) -> Self {
        self.debug_prompt = true;
        self
    }

    pub fn with_debug_response(mut self) -> Self {
        self.debug_response = true;
        self
    }

    /// Add a provider-specific pass-through field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

fn normalize_keys(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let key = PARAM_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or(key);
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_schema() -> Value {
        json!({
            "type": "object",
            "properties": { "answer": { "type": "string" } },
            "required": ["answer"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_valid_format_has_no_violations() {
        let format = ResponseFormat::new("answer", valid_schema());
        assert!(format.is_valid());
    }

    #[test]
    fn test_empty_format_reports_every_invariant() {
        let format: ResponseFormat = serde_json::from_value(json!({})).unwrap();
        assert_eq!(format.violations().len(), 6);
    }

    #[test]
    fn test_non_object_format_is_kept_as_invalid() {
        let params = CallParams::from_value(json!({"response_format": "json"})).unwrap();
        let format = params.response_format.unwrap();
        assert_eq!(format.violations().len(), 6);

        let params = CallParams::from_value(json!({"response_format": null})).unwrap();
        assert!(params.response_format.is_none());
    }

    #[test]
    fn test_params_from_camel_case() {
        let params = CallParams::from_value(json!({
            "debugPrompt": true,
            "maxTokens": 12,
            "top_k": 3
        }))
        .unwrap();

        assert!(params.debug_prompt);
        assert_eq!(params.max_tokens, Some(12));
        assert_eq!(params.extra.get("top_k"), Some(&json!(3)));
    }

    #[test]
    fn test_explicit_params_win_over_defaults() {
        let mut defaults = Map::new();
        defaults.insert("temperature".to_string(), json!(0.2));
        defaults.insert("model".to_string(), json!("default-model"));
        defaults.insert("debugPrompt".to_string(), json!(true));

        let params = CallParams::new().with_model("explicit").merged_over(&defaults).unwrap();

        assert_eq!(params.model.as_deref(), Some("explicit"));
        assert_eq!(params.temperature, Some(0.2));
        assert!(params.debug_prompt);
    }

    #[test]
    fn test_joined_text_skips_images() {
        let content = MessageContent::Parts(vec![
            Attachment::image("https://example.com/a.png"),
            Attachment::text("caption"),
        ]);
        assert_eq!(content.joined_text(), "caption");
        assert_eq!(content.as_text(), None);
    }
}
