//! Configuration schema structures with serde support

use super::env::read_env_var;
use super::error::{ConfigError, ValidationError};
use super::secrets::{SafeLogging, SecretString};
use crate::providers::{ProviderInstance, ProviderKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelgateConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Configured provider instances
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

impl ModelgateConfig {
    /// Look up a provider by name
    pub fn provider(&self, name: &str) -> Result<&ProviderSettings, ConfigError> {
        self.providers
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Basic structural validation; see `ConfigValidator` for the full rule set
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError::missing("version"));
        }
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.trim().is_empty() {
                return Err(ValidationError::missing(format!("providers[{}].name", i)));
            }
            if provider.api_key.is_empty() {
                return Err(ValidationError::missing(format!("providers[{}].api_key", i)));
            }
        }
        Ok(())
    }
}

/// Settings for one provider instance
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Unique name used to look the provider up
    pub name: String,

    /// Provider family
    #[serde(rename = "type")]
    pub kind: ProviderKind,

    /// API key (supports environment variable interpolation)
    pub api_key: SecretString,

    /// Endpoint override; the family default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Default model for text calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Options merged under explicit call parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub default_options: Map<String, Value>,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind, api_key: impl Into<SecretString>) -> Self {
        Self {
            name: kind.as_str().to_string(),
            kind,
            api_key: api_key.into(),
            base_url: None,
            model: None,
            default_options: Map::new(),
        }
    }

    /// Read the API key for `kind` from its conventional environment variable
    pub fn from_env(kind: ProviderKind) -> Result<Self, ConfigError> {
        let api_key = read_env_var(kind.api_key_env_var())?;
        Ok(Self::new(kind, api_key))
    }

    /// Build a provider instance from these settings
    pub fn into_instance(self) -> ProviderInstance {
        let mut instance = self
            .kind
            .create(self.api_key.expose_secret(), self.base_url.as_deref());
        if let Some(model) = self.model {
            instance.set_model(model);
        }
        instance.set_default_options(self.default_options);
        instance
    }
}

impl SafeLogging for ProviderSettings {
    fn safe_for_logging(&self) -> String {
        format!(
            "{} ({}) base_url={} api_key={}",
            self.name,
            self.kind.as_str(),
            self.base_url.as_deref().unwrap_or_else(|| self.kind.default_base_url()),
            self.api_key
        )
    }
}
