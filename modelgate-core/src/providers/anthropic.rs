//! Anthropic provider implementation
//!
//! Handles the differences in message format and capabilities: a dedicated
//! API-key header, system prompts lifted out of the message list, inline
//! base64 image blocks and no schema enforcement.

use crate::http::RequestDescriptor;
use crate::protocol::{Attachment, CallParams, Message, MessageContent, Role};
use crate::providers::adapter::{
    insert_extra, join_url, ImageEncoding, JsonCapability, Operation, ProviderAdapter,
    ProviderCapabilities, ProviderKind,
};
use crate::providers::attachments::ResolvedImages;
use crate::providers::extract::text_at;
use serde_json::{json, Map, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_TEXT_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_VISION_MODEL: &str = "claude-3-5-sonnet-latest";
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic adapter
pub struct AnthropicAdapter {
    capabilities: ProviderCapabilities,
}

impl AnthropicAdapter {
    /// Create a new Anthropic adapter
    pub fn new() -> Self {
        let capabilities = ProviderCapabilities {
            json_mode: JsonCapability::DirectiveOnly, // No native JSON mode
            image_input: ImageEncoding::InlineBase64,
            image_generation: false,
            max_tokens_param: "max_tokens",
            default_max_tokens: 1024,
        };

        Self { capabilities }
    }

    /// Split system text from the conversation turns
    fn convert_messages(&self, messages: &[Message], images: &ResolvedImages) -> (Option<String>, Vec<Value>) {
        let mut system = Vec::new();
        let mut converted = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system.push(message.content.joined_text()),
                Role::User | Role::Assistant => {
                    let content = match &message.content {
                        MessageContent::Text(text) => json!(text),
                        MessageContent::Parts(parts) => Value::Array(
                            parts.iter().map(|part| content_block(part, images)).collect(),
                        ),
                    };
                    converted.push(json!({"role": message.role.as_str(), "content": content}));
                }
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, converted)
    }
}

fn content_block(part: &Attachment, images: &ResolvedImages) -> Value {
    match part {
        Attachment::Text { text } => json!({"type": "text", "text": text}),
        Attachment::Image { reference } => {
            let image = images.inline(reference);
            json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.mime_type,
                    "data": image.data,
                }
            })
        }
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn default_model(&self, operation: Operation) -> &'static str {
        match operation {
            Operation::Vision => DEFAULT_VISION_MODEL,
            Operation::Text | Operation::ImageGeneration => DEFAULT_TEXT_MODEL,
        }
    }

    fn build_request(
        &self,
        api_key: &str,
        base_url: &str,
        messages: &[Message],
        images: &ResolvedImages,
        params: &CallParams,
    ) -> RequestDescriptor {
        let model = params.model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL);
        let (system, messages) = self.convert_messages(messages, images);

        let mut payload = Map::new();
        payload.insert("model".to_string(), json!(model));
        payload.insert(
            self.capabilities.max_tokens_param.to_string(),
            json!(params.max_tokens.unwrap_or(self.capabilities.default_max_tokens)),
        );
        if let Some(system) = system {
            payload.insert("system".to_string(), json!(system));
        }
        payload.insert("messages".to_string(), Value::Array(messages));
        if let Some(temperature) = params.temperature {
            payload.insert("temperature".to_string(), json!(temperature));
        }

        let mut payload = Value::Object(payload);
        insert_extra(&mut payload, &params.extra, &["model", "messages", "system"]);

        RequestDescriptor::post(join_url(base_url, "/messages"), payload)
            .with_header("x-api-key", api_key)
            .with_header("anthropic-version", API_VERSION)
    }

    /// The first content block's value under its own declared type
    fn extract_content(&self, response: &Value) -> String {
        let block_type = text_at(response, "/content/0/type");
        if block_type.is_empty() || block_type.contains('/') || block_type.contains('~') {
            return String::new();
        }
        text_at(response, &format!("/content/0/{}", block_type))
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}
