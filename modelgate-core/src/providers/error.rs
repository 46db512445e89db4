//! Provider error types
//!
//! Only contract violations detected before any I/O are errors. Invalid
//! response formats and transport failures are returned as
//! [`CallResult`](crate::http::CallResult) values instead.

use std::fmt;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Optional provider capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ImageAnalysis,
    ImageGeneration,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ImageAnalysis => write!(f, "image analysis"),
            Capability::ImageGeneration => write!(f, "image generation"),
        }
    }
}

/// Errors raised before a request is built
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured
    #[error("Missing credential: no API key configured for {provider}")]
    MissingCredential { provider: String },

    /// Prompt input has an unsupported shape
    #[error("Invalid prompt shape: {0}")]
    InvalidPromptShape(String),

    /// Provider cannot perform the requested operation
    #[error("Unsupported capability: {provider} does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: Capability,
    },

    /// Call parameters could not be merged or parsed
    #[error("Invalid call parameters: {0}")]
    InvalidParameters(String),
}

impl ProviderError {
    pub fn unsupported(provider: impl Into<String>, capability: Capability) -> Self {
        ProviderError::UnsupportedCapability {
            provider: provider.into(),
            capability,
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::InvalidParameters(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_names_provider() {
        let err = ProviderError::unsupported("deepseek", Capability::ImageAnalysis);
        assert_eq!(
            err.to_string(),
            "Unsupported capability: deepseek does not support image analysis"
        );
    }
}
