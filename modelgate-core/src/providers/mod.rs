//! Provider abstraction and request pipeline
//!
//! This module implements the provider abstraction layer: one adapter per
//! provider family behind a single trait, plus the shared stages every call
//! passes through (context, messages, response-format negotiation,
//! attachments, extraction).

pub mod adapter;
pub mod anthropic;
pub mod attachments;
pub mod chat_completions;
pub mod context;
pub mod deepseek;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod instance;
pub mod messages;
pub mod mistral;
pub mod openai;
pub mod response_format;

pub use adapter::{
    ImageEncoding, JsonCapability, Operation, ProviderAdapter, ProviderCapabilities, ProviderKind,
};
pub use context::{ContextEntry, ContextStore};
pub use error::{Capability, ProviderError, ProviderResult};
pub use instance::ProviderInstance;

// Re-export concrete adapters
pub use anthropic::AnthropicAdapter;
pub use deepseek::DeepSeekAdapter;
pub use gemini::GeminiAdapter;
pub use mistral::MistralAdapter;
pub use openai::OpenAIAdapter;
