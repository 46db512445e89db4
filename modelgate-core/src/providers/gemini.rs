//! Google Gemini provider implementation
//!
//! The API key travels as a URL query parameter, message content nests under
//! `parts`, and structured output goes into `generationConfig` with the
//! schema stripped of `additionalProperties`.

use crate::http::RequestDescriptor;
use crate::protocol::{Attachment, CallParams, Message, MessageContent, Role};
use crate::providers::adapter::{
    append_query, insert_extra, join_url, ImageEncoding, JsonCapability, Operation,
    ProviderAdapter, ProviderCapabilities, ProviderKind,
};
use crate::providers::attachments::ResolvedImages;
use crate::providers::extract::text_at;
use crate::providers::response_format::strip_additional_properties;
use serde_json::{json, Map, Value};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_VISION_MODEL: &str = "gemini-1.5-pro";

/// Gemini adapter
pub struct GeminiAdapter {
    capabilities: ProviderCapabilities,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            capabilities: ProviderCapabilities {
                json_mode: JsonCapability::Native,
                image_input: ImageEncoding::InlineBase64,
                image_generation: false,
                max_tokens_param: "maxOutputTokens",
                default_max_tokens: 2048,
            },
        }
    }

    fn generation_config(&self, params: &CallParams) -> Value {
        let mut config = Map::new();
        config.insert(
            self.capabilities.max_tokens_param.to_string(),
            json!(params.max_tokens.unwrap_or(self.capabilities.default_max_tokens)),
        );
        if let Some(temperature) = params.temperature {
            config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(format) = &params.response_format {
            config.insert("responseMimeType".to_string(), json!("application/json"));
            config.insert("responseSchema".to_string(), strip_additional_properties(&format.schema));
        }
        Value::Object(config)
    }
}

fn parts(content: &MessageContent, images: &ResolvedImages) -> Vec<Value> {
    match content {
        MessageContent::Text(text) => vec![json!({"text": text})],
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                Attachment::Text { text } => json!({"text": text}),
                Attachment::Image { reference } => {
                    let image = images.inline(reference);
                    json!({"inline_data": {"mime_type": image.mime_type, "data": image.data}})
                }
            })
            .collect(),
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
        let model = model.strip_prefix("models/").unwrap_or(model);

        let mut system = Vec::new();
        let mut contents = Vec::new();
        for message in messages {
            let role = match message.role {
                Role::System => {
                    system.extend(parts(&message.content, images));
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(json!({"role": role, "parts": parts(&message.content, images)}));
        }

        let mut payload = Map::new();
        payload.insert("contents".to_string(), Value::Array(contents));
        if !system.is_empty() {
            payload.insert("systemInstruction".to_string(), json!({"parts": system}));
        }
        payload.insert("generationConfig".to_string(), self.generation_config(params));

        let mut payload = Value::Object(payload);
        insert_extra(&mut payload, &params.extra, &["contents", "systemInstruction", "generationConfig"]);

        let url = join_url(base_url, &format!("/models/{}:generateContent", model));
        RequestDescriptor::post(append_query(&url, "key", api_key), payload)
    }

    fn extract_content(&self, response: &Value) -> String {
        text_at(response, "/candidates/0/content/parts/0/text")
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}
