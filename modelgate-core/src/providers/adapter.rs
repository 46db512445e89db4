//! Provider adapter trait and capabilities
//!
//! Defines the core abstraction every provider family implements. An adapter
//! is selected once when a provider instance is created and never
//! re-dispatched per call.

use crate::config::SecretString;
use crate::http::RequestDescriptor;
use crate::protocol::{CallParams, Message};
use crate::providers::attachments::ResolvedImages;
use crate::providers::error::{Capability, ProviderError, ProviderResult};
use crate::providers::instance::ProviderInstance;
use crate::providers::{anthropic, deepseek, gemini, mistral, openai};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Core trait that all provider adapters implement
///
/// Adapters are pure: building a request depends only on the arguments.
pub trait ProviderAdapter: Send + Sync {
    /// Provider family of this adapter
    fn kind(&self) -> ProviderKind;

    /// Get the provider's name
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Get the provider's capabilities
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Default model for an operation
    fn default_model(&self, operation: Operation) -> &'static str;

    /// Build a text or multi-modal completion request
    ///
    /// `params.model` is expected to be resolved already; the adapter falls
    /// back to its text default otherwise.
    fn build_request(
        &self,
        api_key: &str,
        base_url: &str,
        messages: &[Message],
        images: &ResolvedImages,
        params: &CallParams,
    ) -> RequestDescriptor;

    /// Build an image generation request
    fn build_image_generation(
        &self,
        _api_key: &str,
        _base_url: &str,
        _prompt: &str,
        _params: &CallParams,
    ) -> ProviderResult<RequestDescriptor> {
        Err(ProviderError::unsupported(self.name(), Capability::ImageGeneration))
    }

    /// Locate the answer text in a success response; empty when absent
    fn extract_content(&self, response: &Value) -> String;

    /// Locate the generated image reference in an image generation response
    fn extract_image(&self, response: &Value) -> String {
        self.extract_content(response)
    }
}

/// How a provider accepts an output schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonCapability {
    /// Machine-checked schema embedded in the payload
    Native,
    /// "Respond as JSON" flag without schema enforcement
    JsonObjectFlag,
    /// Natural-language directive only
    DirectiveOnly,
}

/// How a provider accepts image attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEncoding {
    /// Bare URL reference, passed through unchanged
    Url,
    /// Inline base64 bytes with a separate MIME type
    InlineBase64,
    /// `data:<mime>;base64,<bytes>` URI
    DataUri,
    /// No image input
    Unsupported,
}

impl ImageEncoding {
    /// Whether image bytes must be fetched before building a request
    pub fn needs_bytes(&self) -> bool {
        matches!(self, ImageEncoding::InlineBase64 | ImageEncoding::DataUri)
    }
}

/// Provider capabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderCapabilities {
    /// Response-format support
    pub json_mode: JsonCapability,

    /// Image input support
    pub image_input: ImageEncoding,

    /// Does the provider generate images?
    pub image_generation: bool,

    /// Payload field carrying the output token limit
    pub max_tokens_param: &'static str,

    /// Token limit used when the caller gives none
    pub default_max_tokens: u32,
}

/// Kind of call, used to pick default models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Text,
    Vision,
    ImageGeneration,
}

/// Supported provider families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
    Mistral,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Mistral,
        ProviderKind::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mistral => "mistral",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    /// Conventional environment variable holding this family's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Mistral => "MISTRAL_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => openai::DEFAULT_BASE_URL,
            ProviderKind::Anthropic => anthropic::DEFAULT_BASE_URL,
            ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
            ProviderKind::Mistral => mistral::DEFAULT_BASE_URL,
            ProviderKind::DeepSeek => deepseek::DEFAULT_BASE_URL,
        }
    }

    /// Create the adapter for this family
    pub fn create_adapter(&self) -> Box<dyn ProviderAdapter> {
        match self {
            ProviderKind::OpenAI => Box::new(openai::OpenAIAdapter::new()),
            ProviderKind::Anthropic => Box::new(anthropic::AnthropicAdapter::new()),
            ProviderKind::Gemini => Box::new(gemini::GeminiAdapter::new()),
            ProviderKind::Mistral => Box::new(mistral::MistralAdapter::new()),
            ProviderKind::DeepSeek => Box::new(deepseek::DeepSeekAdapter::new()),
        }
    }

    /// Create a provider instance bound to this family
    ///
    /// `endpoint` overrides the family's default base URL.
    pub fn create(&self, api_key: impl Into<SecretString>, endpoint: Option<&str>) -> ProviderInstance {
        ProviderInstance::new(*self, api_key, endpoint)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Join a base URL and a path, stripping exactly one trailing slash from
/// the base
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{}{}", base, path)
}

/// Append a URL-encoded query parameter
pub fn append_query(url: &str, name: &str, value: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, separator, name, encoded)
}

/// Copy pass-through parameters into a payload without touching the
/// `protected` keys
pub fn insert_extra(payload: &mut Value, extra: &Map<String, Value>, protected: &[&str]) {
    if let Value::Object(map) = payload {
        for (key, value) in extra {
            if !protected.contains(&key.as_str()) {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}
