//! Shared mapping for chat-completions style APIs
//!
//! OpenAI, Mistral and DeepSeek share the message shape and the
//! `choices[0].message.content` response envelope; they differ in image
//! parts, token parameter names and response-format flags.

use crate::protocol::{Attachment, CallParams, Message, MessageContent};
use crate::providers::adapter::ProviderCapabilities;
use serde_json::{json, Map, Value};

/// JSON pointer to the answer text
pub const CONTENT_POINTER: &str = "/choices/0/message/content";

/// Map canonical messages, rendering image attachments with `image_part`
pub fn chat_messages(messages: &[Message], image_part: impl Fn(&str) -> Value) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let content = match &message.content {
                MessageContent::Text(text) => json!(text),
                MessageContent::Parts(parts) => Value::Array(
                    parts
                        .iter()
                        .map(|part| match part {
                            Attachment::Text { text } => json!({"type": "text", "text": text}),
                            Attachment::Image { reference } => image_part(reference),
                        })
                        .collect(),
                ),
            };
            json!({"role": message.role.as_str(), "content": content})
        })
        .collect()
}

/// Base payload: model, messages, token limit and temperature
pub fn base_payload(
    model: &str,
    messages: Vec<Value>,
    capabilities: &ProviderCapabilities,
    params: &CallParams,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("model".to_string(), json!(model));
    payload.insert("messages".to_string(), Value::Array(messages));
    payload.insert(
        capabilities.max_tokens_param.to_string(),
        json!(params.max_tokens.unwrap_or(capabilities.default_max_tokens)),
    );
    if let Some(temperature) = params.temperature {
        payload.insert("temperature".to_string(), json!(temperature));
    }
    payload
}

/// Keys pass-through parameters may not override
pub const PROTECTED_KEYS: &[&str] = &["model", "messages"];
