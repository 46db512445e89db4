//! DeepSeek provider implementation
//!
//! Text-only chat-completions API with no schema support.

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

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_TEXT_MODEL: &str = "deepseek-chat";

/// DeepSeek adapter
pub struct DeepSeekAdapter {
    capabilities: ProviderCapabilities,
}

impl DeepSeekAdapter {
    pub fn new() -> Self {
        Self {
            capabilities: ProviderCapabilities {
                json_mode: JsonCapability::DirectiveOnly,
                image_input: ImageEncoding::Unsupported,
                image_generation: false,
                max_tokens_param: "max_tokens",
                default_max_tokens: 2048,
            },
        }
    }
}

impl ProviderAdapter for DeepSeekAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn default_model(&self, _operation: Operation) -> &'static str {
        DEFAULT_TEXT_MODEL
    }

    fn build_request(
        &self,
        api_key: &str,
        base_url: &str,
        messages: &[Message],
        _images: &ResolvedImages,
        params: &CallParams,
    ) -> RequestDescriptor {
        let model = params.model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL);
        // Image parts never reach this adapter; the instance rejects them first
        let messages = chat_messages(messages, |reference| json!({"type": "text", "text": reference}));

        let mut payload = Value::Object(base_payload(model, messages, &self.capabilities, params));
        insert_extra(&mut payload, &params.extra, PROTECTED_KEYS);

        RequestDescriptor::post(join_url(base_url, "/chat/completions"), payload)
            .with_header("Authorization", format!("Bearer {}", api_key))
    }

    fn extract_content(&self, response: &Value) -> String {
        text_at(response, CONTENT_POINTER)
    }
}

impl Default for DeepSeekAdapter {
    fn default() -> Self {
        Self::new()
    }
}
