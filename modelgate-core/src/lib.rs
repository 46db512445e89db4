//! Modelgate Core Library
//!
//! Provider-agnostic request building and response normalization for LLM
//! APIs. A [`ProviderInstance`] is bound to one provider family at
//! construction, collects labelled context, negotiates JSON response formats
//! and drives a single injected, blocking HTTP transport per call.

pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;

pub use http::{CallResult, FailureReport, HttpMethod, HttpTransport, ImageFetcher, RequestDescriptor};
pub use protocol::{Attachment, CallParams, Message, MessageContent, Prompt, ResponseFormat, Role};
pub use providers::{ProviderError, ProviderInstance, ProviderKind, ProviderResult};

/// Returns the version of the Modelgate Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
