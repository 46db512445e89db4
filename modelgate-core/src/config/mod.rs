//! Configuration module for Modelgate
//!
//! This module provides the configuration schema, environment interpolation,
//! validation and secret redaction used to set up provider instances.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{interpolate_env_vars, read_env_var};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{ModelgateConfig, ProviderSettings};
pub use secrets::{is_sensitive_name, redact_by_field_name, SafeLogging, SecretString, REDACTED};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ModelgateConfig> {
    let path = path.as_ref();
    let content = read_config(path)?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: ModelgateConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ModelgateConfig> {
    let path = path.as_ref();
    let content = read_config(path)?;

    let interpolated = env::interpolate_env_vars(&content)?;

    let config: ModelgateConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish(config)
}

fn read_config(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn finish(config: ModelgateConfig) -> ConfigResult<ModelgateConfig> {
    ConfigValidator::new().validate(&config)?;
    for provider in &config.providers {
        debug!("Loaded provider {}", provider.safe_for_logging());
    }
    Ok(config)
}
