//! Provider instance
//!
//! A `ProviderInstance` is bound to one provider family when it is created.
//! It owns the credential, endpoint, model and default options for that
//! family, the context store, and the two injected I/O primitives. Every
//! public call runs the same pipeline: validate, negotiate the response
//! format, assemble messages, resolve images, build, execute, extract.

use crate::config::SecretString;
use crate::http::{
    execute, CallResult, FailureReport, HttpTransport, ImageFetcher, ReqwestTransport,
};
use crate::protocol::{CallParams, Message, Prompt};
use crate::providers::adapter::{
    ImageEncoding, Operation, ProviderAdapter, ProviderCapabilities, ProviderKind,
};
use crate::providers::attachments::{image_messages, resolve_images, ResolvedImages};
use crate::providers::context::{ContextEntry, ContextStore};
use crate::providers::error::{Capability, ProviderError, ProviderResult};
use crate::providers::extract::coerce;
use crate::providers::messages::{build_messages, has_images, with_context};
use crate::providers::response_format::{negotiate, Negotiation};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A configured client for one provider family
pub struct ProviderInstance {
    adapter: Box<dyn ProviderAdapter>,
    api_key: SecretString,
    base_url: String,
    model: Option<String>,
    default_options: Map<String, Value>,
    contexts: ContextStore,
    transport: Arc<dyn HttpTransport>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl ProviderInstance {
    /// Create an instance using the reqwest-backed transport and fetcher
    ///
    /// `endpoint` overrides the family's default base URL.
    pub fn new(kind: ProviderKind, api_key: impl Into<SecretString>, endpoint: Option<&str>) -> Self {
        let client = Arc::new(ReqwestTransport::new());
        Self {
            adapter: kind.create_adapter(),
            api_key: api_key.into(),
            base_url: endpoint.unwrap_or(kind.default_base_url()).to_string(),
            model: None,
            default_options: Map::new(),
            contexts: ContextStore::new(),
            transport: client.clone(),
            fetcher: client,
        }
    }

    /// Replace the HTTP transport
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the image fetcher
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.adapter.kind()
    }

    pub fn name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        self.adapter.capabilities()
    }

    pub fn default_options(&self) -> &Map<String, Value> {
        &self.default_options
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Rebind the credential and endpoint; `None` restores the family's
    /// default base URL
    pub fn configure(&mut self, api_key: impl Into<SecretString>, endpoint: Option<&str>) -> &mut Self {
        self.api_key = api_key.into();
        self.base_url = endpoint
            .unwrap_or(self.kind().default_base_url())
            .to_string();
        self
    }

    /// Model used for text and vision calls when none is given per call
    pub fn set_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.model = Some(model.into());
        self
    }

    /// Options merged under every call's explicit parameters
    pub fn set_default_options(&mut self, options: Map<String, Value>) -> &mut Self {
        self.default_options = options;
        self
    }

    pub fn add_context(&mut self, label: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.contexts.add(label, value.into());
        self
    }

    pub fn get_context(&self, label: Option<&str>) -> Vec<&ContextEntry> {
        self.contexts.get(label)
    }

    pub fn clear_context(&mut self, label: Option<&str>) -> &mut Self {
        self.contexts.clear(label);
        self
    }

    /// Text (or multi-modal) completion
    pub fn generate_text(&mut self, prompt: impl Into<Prompt>, params: &CallParams) -> ProviderResult<CallResult> {
        self.require_credential()?;
        let params = self.merge_params(params)?;
        let messages = build_messages(prompt.into())?;

        if has_images(&messages) && self.capabilities().image_input == ImageEncoding::Unsupported {
            return Err(ProviderError::unsupported(self.name(), Capability::ImageAnalysis));
        }

        Ok(self.complete(messages, params, Operation::Text))
    }

    /// Ask the model about one or more images
    pub fn analyze_image<S: AsRef<str>>(
        &mut self,
        image_refs: &[S],
        prompt: &str,
        params: &CallParams,
    ) -> ProviderResult<CallResult> {
        if self.capabilities().image_input == ImageEncoding::Unsupported {
            return Err(ProviderError::unsupported(self.name(), Capability::ImageAnalysis));
        }
        self.require_credential()?;
        let params = self.merge_params(params)?;

        Ok(self.complete(image_messages(image_refs, prompt), params, Operation::Vision))
    }

    /// Generate an image from a text prompt
    ///
    /// The instance model is not applied here; only the `model` call
    /// parameter or the family's image default.
    pub fn generate_image(&mut self, prompt: &str, params: &CallParams) -> ProviderResult<CallResult> {
        if !self.capabilities().image_generation {
            return Err(ProviderError::unsupported(self.name(), Capability::ImageGeneration));
        }
        self.require_credential()?;
        let mut params = self.merge_params(params)?;
        if params.model.is_none() {
            params.model = Some(self.adapter.default_model(Operation::ImageGeneration).to_string());
        }

        let request = self
            .adapter
            .build_image_generation(self.api_key.expose_secret(), &self.base_url, prompt, &params)?
            .with_debug_flags(params.debug_prompt, params.debug_response);

        Ok(match execute(self.transport.as_ref(), self.name(), request) {
            CallResult::Raw(response) if !params.debug_response => {
                CallResult::Text(self.adapter.extract_image(&response))
            }
            other => other,
        })
    }

    fn require_credential(&self) -> ProviderResult<()> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential {
                provider: self.name().to_string(),
            });
        }
        Ok(())
    }

    fn merge_params(&self, params: &CallParams) -> ProviderResult<CallParams> {
        params
            .merged_over(&self.default_options)
            .map_err(|err| ProviderError::InvalidParameters(err.to_string()))
    }

    fn complete(&mut self, messages: Vec<Message>, mut params: CallParams, operation: Operation) -> CallResult {
        let capabilities = self.adapter.capabilities().clone();

        if let Negotiation::Rejected(violations) =
            negotiate(params.response_format.as_ref(), capabilities.json_mode, &mut self.contexts)
        {
            return CallResult::InvalidResponseFormat(violations);
        }

        let messages = with_context(messages, self.contexts.to_message());
        if params.model.is_none() {
            params.model = Some(
                self.model
                    .clone()
                    .unwrap_or_else(|| self.adapter.default_model(operation).to_string()),
            );
        }

        let api_key = self.api_key.expose_secret();
        let images = match resolve_images(
            &messages,
            capabilities.image_input,
            self.fetcher.as_ref(),
            params.debug_prompt,
        ) {
            Ok(images) => images,
            Err(err) => {
                warn!("Image fetch failed for {}: {}", self.name(), err);
                let request = self
                    .adapter
                    .build_request(api_key, &self.base_url, &messages, &ResolvedImages::default(), &params)
                    .with_debug_flags(params.debug_prompt, params.debug_response);
                return CallResult::Failure(FailureReport::new(&request, err.to_string()));
            }
        };

        let request = self
            .adapter
            .build_request(api_key, &self.base_url, &messages, &images, &params)
            .with_debug_flags(params.debug_prompt, params.debug_response);
        debug!("Built {} request with {} messages", self.name(), messages.len());

        match execute(self.transport.as_ref(), self.name(), request) {
            CallResult::Raw(response) if !params.debug_response => coerce(
                self.adapter.extract_content(&response),
                params.response_format.is_some(),
            ),
            other => other,
        }
    }
}

impl fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("kind", &self.kind())
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("default_options", &self.default_options)
            .field("contexts", &self.contexts.len())
            .finish()
    }
}
