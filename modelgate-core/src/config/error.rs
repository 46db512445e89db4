//! Configuration errors

use std::fmt;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure to load or resolve a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Environment variable '{var}' is not set")]
    EnvVarNotFound { var: String },

    #[error("No provider named '{name}' is configured")]
    UnknownProvider { name: String },
}

/// A rejected configuration value, located by its field path
/// (e.g. `providers[0].base_url`)
#[derive(Debug, Error)]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)
    }
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    MissingField,

    #[error("provider name '{name}' is used more than once")]
    DuplicateName { name: String },

    #[error("not a valid URL: {message}")]
    InvalidBaseUrl { message: String },

    #[error("URL scheme must be http or https, got '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("config version '{actual}' is not supported (expected one of: {expected})")]
    UnsupportedVersion { expected: String, actual: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
        }
    }

    pub fn missing(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::MissingField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_field_path() {
        let err = ValidationError::new(
            "providers[1].base_url",
            ValidationErrorKind::UnsupportedScheme {
                scheme: "ftp".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "providers[1].base_url: URL scheme must be http or https, got 'ftp'"
        );
    }
}
