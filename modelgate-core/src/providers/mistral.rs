//! Mistral provider implementation
//!
//! Chat-completions shape with a "respond as JSON" flag but no schema
//! enforcement, so the schema itself travels as a context directive.
//! Images are sent as MIME-typed data URIs.

use crate::http::RequestDescriptor;
use crate::protocol::{CallParams, Message};
use crate::providers::adapter::{
    insert_extra, join_url, ImageEncoding, JsonCapability, Operation, ProviderAdapter,
    ProviderCapabilities, ProviderKind,
};
use crate::providers::attachments::ResolvedImages;
use crate::providers::chat_completions::{base_payload, chat_messages, CONTENT_POINTER, PROTECTED_KEYS};
use crate::providers::extract::text_at;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_TEXT_MODEL: &str = "mistral-small-latest";
pub const DEFAULT_VISION_MODEL: &str = "pixtral-12b-2409";

/// Mistral adapter
pub struct MistralAdapter {
    capabilities: ProviderCapabilities,
}

impl MistralAdapter {
    pub fn new() -> Self {
        Self {
            capabilities: ProviderCapabilities {
                json_mode: JsonCapability::JsonObjectFlag,
                image_input: ImageEncoding::DataUri,
                image_generation: false,
                max_tokens_param: "max_tokens",
                default_max_tokens: 1024,
            },
        }
    }
}

impl ProviderAdapter for MistralAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mistral
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
        let messages = chat_messages(messages, |reference| {
            json!({"type": "image_url", "image_url": images.inline(reference).data_uri()})
        });

        let mut payload = base_payload(model, messages, &self.capabilities, params);
        if params.response_format.is_some() {
            payload.insert("response_format".to_string(), json!({"type": "json_object"}));
        }

        let mut payload = Value::Object(payload);
        insert_extra(&mut payload, &params.extra, PROTECTED_KEYS);

        RequestDescriptor::post(join_url(base_url, "/chat/completions"), payload)
            .with_header("Authorization", format!("Bearer {}", api_key))
    }

    fn extract_content(&self, response: &Value) -> String {
        text_at(response, CONTENT_POINTER)
    }
}

impl Default for MistralAdapter {
    fn default() -> Self {
        Self::new()
    }
}
