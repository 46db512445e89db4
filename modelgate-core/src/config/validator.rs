//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::ModelgateConfig;
use std::collections::HashSet;
use url::Url;

/// Configuration schema versions this library understands
const SUPPORTED_VERSIONS: &[&str] = &["0.1"];

/// Configuration validator with additional validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ModelgateConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_version(config)?;
        self.validate_unique_names(config)?;
        self.validate_base_urls(config)?;

        Ok(())
    }

    fn validate_version(&self, config: &ModelgateConfig) -> Result<(), ValidationError> {
        if SUPPORTED_VERSIONS.contains(&config.version.as_str()) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "version",
                ValidationErrorKind::UnsupportedVersion {
                    expected: SUPPORTED_VERSIONS.join(", "),
                    actual: config.version.clone(),
                },
            ))
        }
    }

    fn validate_unique_names(&self, config: &ModelgateConfig) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for (i, provider) in config.providers.iter().enumerate() {
            if !seen.insert(provider.name.as_str()) {
                return Err(ValidationError::new(
                    format!("providers[{}].name", i),
                    ValidationErrorKind::DuplicateName {
                        name: provider.name.clone(),
                    },
                ));
            }
        }
        Ok(())
    }

    /// Endpoint overrides must be absolute http(s) URLs
    fn validate_base_urls(&self, config: &ModelgateConfig) -> Result<(), ValidationError> {
        for (i, provider) in config.providers.iter().enumerate() {
            let Some(base_url) = &provider.base_url else {
                continue;
            };
            let field = format!("providers[{}].base_url", i);

            let parsed = Url::parse(base_url).map_err(|e| {
                ValidationError::new(
                    field.clone(),
                    ValidationErrorKind::InvalidBaseUrl {
                        message: e.to_string(),
                    },
                )
            })?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::new(
                    field,
                    ValidationErrorKind::UnsupportedScheme {
                        scheme: parsed.scheme().to_string(),
                    },
                ));
            }
        }
        Ok(())
    }
}
