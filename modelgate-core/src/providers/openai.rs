//! OpenAI provider implementation
//!
//! Bearer-token auth, native JSON-schema response formats, bare URL image
//! references and the only image generation endpoint among the families.

use crate::http::RequestDescriptor;
use crate::protocol::{CallParams, Message, ResponseFormat};
use crate::providers::adapter::{
    insert_extra, join_url, ImageEncoding, JsonCapability, Operation, ProviderAdapter,
    ProviderCapabilities, ProviderKind,
};
use crate::providers::attachments::ResolvedImages;
use crate::providers::chat_completions::{base_payload, chat_messages, CONTENT_POINTER, PROTECTED_KEYS};
use crate::providers::error::ProviderResult;
use crate::providers::extract::text_at;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// OpenAI adapter
pub struct OpenAIAdapter {
    capabilities: ProviderCapabilities,
}

impl OpenAIAdapter {
    /// Create a new OpenAI adapter
    pub fn new() -> Self {
        let capabilities = ProviderCapabilities {
            json_mode: JsonCapability::Native,
            image_input: ImageEncoding::Url,
            image_generation: true,
            max_tokens_param: "max_completion_tokens",
            default_max_tokens: 4096,
        };

        Self { capabilities }
    }

    fn headers(request: RequestDescriptor, api_key: &str) -> RequestDescriptor {
        request.with_header("Authorization", format!("Bearer {}", api_key))
    }
}

/// `response_format` wrapper for a strict JSON schema
pub fn json_schema_format(format: &ResponseFormat) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": format.name,
            "strict": format.strict,
            "schema": format.schema,
        }
    })
}

impl ProviderAdapter for OpenAIAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn default_model(&self, operation: Operation) -> &'static str {
        match operation {
            Operation::Text => DEFAULT_TEXT_MODEL,
            Operation::Vision => DEFAULT_VISION_MODEL,
            Operation::ImageGeneration => DEFAULT_IMAGE_MODEL,
        }
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
        let messages = chat_messages(messages, |reference| {
            json!({"type": "image_url", "image_url": {"url": reference}})
        });

        let mut payload = base_payload(model, messages, &self.capabilities, params);
        if let Some(format) = &params.response_format {
            payload.insert("response_format".to_string(), json_schema_format(format));
        }

        let mut payload = Value::Object(payload);
        insert_extra(&mut payload, &params.extra, PROTECTED_KEYS);

        Self::headers(
            RequestDescriptor::post(join_url(base_url, "/chat/completions"), payload),
            api_key,
        )
    }

    fn build_image_generation(
        &self,
        api_key: &str,
        base_url: &str,
        prompt: &str,
        params: &CallParams,
    ) -> ProviderResult<RequestDescriptor> {
        let model = params.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL);
        let mut payload = json!({
            "model": model,
            "prompt": prompt,
            "n": 1,
            "size": DEFAULT_IMAGE_SIZE,
        });
        insert_extra(&mut payload, &params.extra, &["model", "prompt"]);

        Ok(Self::headers(
            RequestDescriptor::post(join_url(base_url, "/images/generations"), payload),
            api_key,
        ))
    }

    fn extract_content(&self, response: &Value) -> String {
        text_at(response, CONTENT_POINTER)
    }

    /// First image URL, falling back to inline base64 data
    fn extract_image(&self, response: &Value) -> String {
        let url = text_at(response, "/data/0/url");
        if url.is_empty() {
            text_at(response, "/data/0/b64_json")
        } else {
            url
        }
    }
}

impl Default for OpenAIAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Attachment, MessageContent, Role};

    #[test]
    fn test_build_request_shape() {
        let adapter = OpenAIAdapter::new();
        let params = CallParams::new().with_temperature(0.5).with_extra("seed", json!(7));

        let request = adapter.build_request(
            "sk-test",
            "https://api.example.com/v1/",
            &[Message::user("Hello")],
            &ResolvedImages::default(),
            &params,
        );

        assert_eq!(request.url, "https://api.example.com/v1/chat/completions");
        assert_eq!(request.headers["Authorization"], "Bearer sk-test");
        assert_eq!(request.payload["model"], DEFAULT_TEXT_MODEL);
        assert_eq!(request.payload["max_completion_tokens"], 4096);
        assert_eq!(request.payload["temperature"], 0.5);
        assert_eq!(request.payload["seed"], 7);
        assert!(request.payload.get("max_tokens").is_none());
        assert!(request.payload.get("response_format").is_none());
    }

    #[test]
    fn test_schema_is_wrapped() {
        let adapter = OpenAIAdapter::new();
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"], "additionalProperties": false});
        let params = CallParams::new().with_response_format(ResponseFormat::new("answer", schema.clone()));

        let request = adapter.build_request("k", DEFAULT_BASE_URL, &[Message::user("q")], &ResolvedImages::default(), &params);

        assert_eq!(request.payload["response_format"]["type"], "json_schema");
        assert_eq!(request.payload["response_format"]["json_schema"]["name"], "answer");
        assert_eq!(request.payload["response_format"]["json_schema"]["strict"], true);
        assert_eq!(request.payload["response_format"]["json_schema"]["schema"], schema);
    }

    #[test]
    fn test_images_pass_through_as_urls() {
        let adapter = OpenAIAdapter::new();
        let message = Message::new(
            Role::User,
            MessageContent::Parts(vec![Attachment::image("https://x.test/cat.heic")]),
        );

        let request = adapter.build_request("k", DEFAULT_BASE_URL, &[message], &ResolvedImages::default(), &CallParams::new());

        assert_eq!(
            request.payload["messages"][0]["content"][0],
            json!({"type": "image_url", "image_url": {"url": "https://x.test/cat.heic"}})
        );
    }

    #[test]
    fn test_image_generation_request_and_extraction() {
        let adapter = OpenAIAdapter::new();
        let params = CallParams::new().with_extra("size", json!("512x512"));

        let request = adapter
            .build_image_generation("k", DEFAULT_BASE_URL, "a red apple", &params)
            .unwrap();

        assert_eq!(request.url, "https://api.openai.com/v1/images/generations");
        assert_eq!(request.payload["model"], DEFAULT_IMAGE_MODEL);
        assert_eq!(request.payload["size"], "512x512");

        assert_eq!(adapter.extract_image(&json!({"data": [{"url": "https://img.test/1.png"}]})), "https://img.test/1.png");
        assert_eq!(adapter.extract_image(&json!({"data": [{"b64_json": "AAAA"}]})), "AAAA");
    }
}
